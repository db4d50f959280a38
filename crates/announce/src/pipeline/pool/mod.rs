pub(crate) mod manager;
pub(crate) mod worker;

pub(crate) use manager::spawn_workers;
