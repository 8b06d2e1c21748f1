// Application layer - services and collaborator contracts
pub mod advice_service;
pub mod aggregation_service;
pub mod history_service;
pub mod live_gate;
pub mod providers;
pub mod reading_repository;
