mod config;
mod events;
mod matching;
mod reload;
