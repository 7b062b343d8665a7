// 🔑 Admin Entity - operator allowed to manage the lot
//
// Line shape in admin/data.txt:
//   name|phone|email|password
//
// The password field holds a SHA-256 hex digest. Files written by older
// builds stored the password itself; those still verify.

use crate::store::{read_string, FlatRecord};
use csv::StringRecord;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Admin {
    pub name: String,
    pub phone: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_digest: String,
}

/// Fields supplied when registering an admin.
#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub password: String,
}

pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn is_digest(value: &str) -> bool {
    value.len() == 64 && value.chars().all(|c| c.is_ascii_hexdigit())
}

impl Admin {
    pub fn new(new: &NewAdmin) -> Self {
        Admin {
            name: new.name.clone(),
            phone: new.phone.clone(),
            email: new.email.clone(),
            password_digest: hash_password(&new.password),
        }
    }

    pub fn verify(&self, password: &str) -> bool {
        if self.password_digest.is_empty() {
            return false;
        }
        if is_digest(&self.password_digest) {
            self.password_digest == hash_password(password)
        } else {
            self.password_digest == password
        }
    }
}

impl FlatRecord for Admin {
    const KIND: &'static str = "admin";

    fn to_fields(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.phone.clone(),
            self.email.clone(),
            self.password_digest.clone(),
        ]
    }

    fn read_fields(&mut self, fields: &StringRecord) {
        read_string(fields, 0, &mut self.name);
        read_string(fields, 1, &mut self.phone);
        read_string(fields, 2, &mut self.email);
        read_string(fields, 3, &mut self.password_digest);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_admin() -> NewAdmin {
        NewAdmin {
            name: "Sadia".to_string(),
            phone: "01711111111".to_string(),
            email: "sadia@gmail.com".to_string(),
            password: "correct horse".to_string(),
        }
    }

    #[test]
    fn test_password_is_hashed() {
        let admin = Admin::new(&new_admin());
        assert_eq!(admin.password_digest.len(), 64);
        assert_ne!(admin.password_digest, "correct horse");
        assert!(admin.verify("correct horse"));
        assert!(!admin.verify("wrong horse"));
    }

    #[test]
    fn test_legacy_plaintext_password() {
        let row = StringRecord::from(vec!["Old", "01700000000", "old@gmail.com", "password1"]);
        let mut admin = Admin::default();
        admin.read_fields(&row);
        assert!(admin.verify("password1"));
        assert!(!admin.verify("password2"));
    }

    #[test]
    fn test_missing_password_field_never_verifies() {
        let row = StringRecord::from(vec!["Sadia", "01711111111", "sadia@gmail.com"]);
        let mut admin = Admin::default();
        admin.read_fields(&row);
        assert!(admin.password_digest.is_empty());
        assert!(!admin.verify(""));
        assert!(!admin.verify("anything"));
    }

    #[test]
    fn test_digest_not_serialized() {
        let admin = Admin::new(&new_admin());
        let json = serde_json::to_string(&admin).unwrap();
        assert!(!json.contains(&admin.password_digest));
    }
}
