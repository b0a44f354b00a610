pub mod constants;
pub mod shared_settlement;
pub mod shared_tavern_game;
pub mod validation;
