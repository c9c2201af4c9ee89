//! Storage Module
//! Mission: Relational persistence for users, tweets, replies, likes, followships

pub mod db;

pub use db::{Database, NewUser, DEFAULT_AVATAR_URL, DEFAULT_COVER_URL};
