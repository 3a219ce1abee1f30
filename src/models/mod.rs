pub mod endpoint;
pub mod payment_credential;
pub mod role_permission;
pub mod static_page;

#[allow(unused_imports)]
pub mod prelude {
    pub use super::endpoint::{self, Entity as Endpoint};
    pub use super::payment_credential::{self, Entity as PaymentCredential};
    pub use super::role_permission::{self, Entity as RolePermission};
    pub use super::static_page::{self, Entity as StaticPage};
}
