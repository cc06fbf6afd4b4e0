use kiln_link::{LinkConfig, LinkOptions};

#[derive(Default, Clone)]
#[salsa::db]
pub struct KilnDatabase {
    storage: salsa::Storage<Self>,
}

#[salsa::db]
impl salsa::Database for KilnDatabase {}

impl KilnDatabase {
    /// Register `options` as the link configuration input of this database.
    pub fn link_config(&self, options: &LinkOptions) -> LinkConfig {
        LinkConfig::from_options(self, options)
    }
}
