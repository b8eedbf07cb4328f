pub mod entity;
pub mod page;
pub mod repository;
