pub mod dump;
pub mod run;
pub mod verify;
