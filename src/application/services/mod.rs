pub mod manifest_service;
