pub mod claim_ticket;
pub mod fulfill_randomness;
