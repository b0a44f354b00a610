pub mod backend_tavern_game;
