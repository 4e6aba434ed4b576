pub mod availability;
pub mod entitlement;
pub mod subscription;
pub mod terms;
