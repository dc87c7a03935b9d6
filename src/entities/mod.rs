pub mod branch;
pub mod category;
pub mod item;
pub mod outgoing_record;
pub mod sale;
pub mod stock_movement;
pub mod user;
