/// Outbound mail
pub mod mail;
/// Federal building and dwelling registry lookups
pub mod registry;
/// E-signature workflow for lease contracts
pub mod signature;
