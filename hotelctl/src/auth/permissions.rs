//! Role-based access control.
//!
//! Each role maps to a fixed set of `(Resource, Operation)` grants. `*All` grants imply the
//! matching `*Own` grant. Handlers declare the permission they need with the
//! [`RequiresPermission`] extractor, which rejects the request before any business logic runs;
//! ownership of the specific entity (a booking's guest, a hotel's manager) is checked afterwards.

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::AppState;
use crate::api::models::users::{CurrentUser, Role};
use crate::db::models::hotels::HotelDBResponse;
use crate::errors::Error;
use crate::types::{Operation, Permission, Resource};

/// Type-level resources for [`RequiresPermission`]
pub mod resource {
    use crate::types::Resource;

    // `Sync` below names a resource, so the marker trait is spelled out
    pub trait ResourceType: Send + std::marker::Sync {
        const RESOURCE: Resource;
    }

    macro_rules! resources {
        ($($name:ident),* $(,)?) => {
            $(
                pub struct $name;
                impl ResourceType for $name {
                    const RESOURCE: Resource = Resource::$name;
                }
            )*
        };
    }

    resources!(Users, Destinations, Hotels, RoomTypes, Inventory, Holds, Pricing, Bookings, Reviews, Sync, Attendance);
}

/// Type-level operations for [`RequiresPermission`]
pub mod operation {
    use crate::types::Operation;

    pub trait OperationType: Send + Sync {
        const OPERATION: Operation;
    }

    macro_rules! operations {
        ($($name:ident),* $(,)?) => {
            $(
                pub struct $name;
                impl OperationType for $name {
                    const OPERATION: Operation = Operation::$name;
                }
            )*
        };
    }

    operations!(CreateAll, CreateOwn, ReadAll, ReadOwn, UpdateAll, UpdateOwn, DeleteAll, DeleteOwn);
}

/// Grants held by a role
fn role_grants(role: Role) -> &'static [(Resource, Operation)] {
    use Operation::*;
    use Resource::*;

    match role {
        Role::Customer => &[
            (Users, ReadOwn),
            (Users, UpdateOwn),
            (Destinations, ReadAll),
            (Hotels, ReadAll),
            (RoomTypes, ReadAll),
            (Inventory, ReadAll),
            (Pricing, ReadAll),
            (Holds, CreateOwn),
            (Holds, ReadOwn),
            (Holds, DeleteOwn),
            (Bookings, CreateOwn),
            (Bookings, ReadOwn),
            (Bookings, UpdateOwn),
            (Reviews, ReadAll),
            (Reviews, CreateOwn),
        ],
        Role::HotelManager => &[
            (Users, ReadOwn),
            (Users, UpdateOwn),
            (Destinations, ReadAll),
            (Hotels, ReadAll),
            (Hotels, CreateOwn),
            (Hotels, UpdateOwn),
            (Hotels, DeleteOwn),
            (RoomTypes, ReadAll),
            (RoomTypes, CreateOwn),
            (RoomTypes, UpdateOwn),
            (RoomTypes, DeleteOwn),
            (Inventory, ReadAll),
            (Pricing, ReadAll),
            (Pricing, CreateOwn),
            (Pricing, UpdateOwn),
            (Pricing, DeleteOwn),
            (Holds, CreateOwn),
            (Holds, ReadOwn),
            (Holds, DeleteOwn),
            (Bookings, CreateOwn),
            (Bookings, ReadOwn),
            (Bookings, UpdateOwn),
            (Reviews, ReadAll),
            (Sync, CreateOwn),
            (Sync, ReadOwn),
            (Attendance, CreateOwn),
            (Attendance, ReadOwn),
        ],
        Role::Admin => &[],
    }
}

/// Whether `role` may perform `operation` on `resource`
pub fn role_has_permission(role: Role, resource: Resource, operation: Operation) -> bool {
    if role == Role::Admin {
        return true;
    }
    let grants = role_grants(role);
    grants.contains(&(resource, operation)) || grants.contains(&(resource, operation.all()))
}

pub fn has_permission(user: &CurrentUser, resource: Resource, operation: Operation) -> bool {
    role_has_permission(user.role, resource, operation)
}

/// Whether `user` manages `hotel`: its owning manager, or any admin
pub fn can_manage_hotel(user: &CurrentUser, hotel: &HotelDBResponse) -> bool {
    user.is_admin() || (user.role == Role::HotelManager && hotel.owner_id == user.id)
}

pub fn forbidden(resource: Resource, operation: Operation, target: impl Into<String>) -> Error {
    Error::InsufficientPermissions {
        required: Permission::Allow(resource, operation),
        action: operation,
        resource: target.into(),
    }
}

/// Extractor that authenticates the caller and checks one role permission.
pub struct RequiresPermission<R, O> {
    pub user: CurrentUser,
    _marker: PhantomData<(R, O)>,
}

impl<R, O> FromRequestParts<AppState> for RequiresPermission<R, O>
where
    R: resource::ResourceType,
    O: operation::OperationType,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        if !has_permission(&user, R::RESOURCE, O::OPERATION) {
            return Err(forbidden(R::RESOURCE, O::OPERATION, R::RESOURCE.to_string()));
        }
        Ok(Self {
            user,
            _marker: PhantomData,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource_of<R: resource::ResourceType>() -> Resource {
        R::RESOURCE
    }

    #[test]
    fn test_type_level_resources_map_to_runtime_resources() {
        assert_eq!(resource_of::<resource::Sync>(), Resource::Sync);
        assert_eq!(resource_of::<resource::Bookings>(), Resource::Bookings);
        assert_eq!(<operation::ReadOwn as operation::OperationType>::OPERATION, Operation::ReadOwn);
    }

    #[test]
    fn test_admin_has_everything() {
        for resource in [Resource::Users, Resource::Sync, Resource::Attendance, Resource::Bookings] {
            assert!(role_has_permission(Role::Admin, resource, Operation::DeleteAll));
        }
    }

    #[test]
    fn test_customer_grants() {
        assert!(role_has_permission(Role::Customer, Resource::Bookings, Operation::CreateOwn));
        assert!(role_has_permission(Role::Customer, Resource::Hotels, Operation::ReadOwn));
        assert!(!role_has_permission(Role::Customer, Resource::Bookings, Operation::ReadAll));
        assert!(!role_has_permission(Role::Customer, Resource::Hotels, Operation::CreateOwn));
        assert!(!role_has_permission(Role::Customer, Resource::Attendance, Operation::CreateOwn));
        assert!(!role_has_permission(Role::Customer, Resource::Sync, Operation::ReadOwn));
    }

    #[test]
    fn test_manager_grants() {
        assert!(role_has_permission(Role::HotelManager, Resource::Pricing, Operation::CreateOwn));
        assert!(role_has_permission(Role::HotelManager, Resource::Attendance, Operation::CreateOwn));
        assert!(!role_has_permission(Role::HotelManager, Resource::Pricing, Operation::CreateAll));
        assert!(!role_has_permission(Role::HotelManager, Resource::Destinations, Operation::CreateAll));
        assert!(!role_has_permission(Role::HotelManager, Resource::Users, Operation::ReadAll));
        assert!(!role_has_permission(Role::HotelManager, Resource::Reviews, Operation::CreateOwn));
    }
}
