pub mod aggregator;
pub mod analyst_worker;
pub mod archive;
pub mod chart;
pub mod email_service;
pub mod object_storage;
pub mod sender_worker;
pub mod table_source;
