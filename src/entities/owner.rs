// 👤 Owner Entity - person a registered vehicle belongs to
//
// Line shape in owners/data.txt:
//   id|name|phone|vehicleId

use crate::store::{read_string, FlatRecord};
use csv::StringRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Owner {
    /// `OWN0001` or a UUID token, depending on the configured scheme
    pub id: String,
    pub name: String,
    pub phone: String,
    /// Vehicle registered together with this owner
    pub vehicle_id: String,
}

impl Owner {
    pub fn new(id: String, name: String, phone: String, vehicle_id: String) -> Self {
        Owner {
            id,
            name,
            phone,
            vehicle_id,
        }
    }
}

impl FlatRecord for Owner {
    const KIND: &'static str = "owner";

    fn to_fields(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.phone.clone(),
            self.vehicle_id.clone(),
        ]
    }

    fn read_fields(&mut self, fields: &StringRecord) {
        read_string(fields, 0, &mut self.id);
        read_string(fields, 1, &mut self.name);
        read_string(fields, 2, &mut self.phone);
        read_string(fields, 3, &mut self.vehicle_id);
    }
}
