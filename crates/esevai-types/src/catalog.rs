//! Static service catalog seeded into storage
//!
//! Both tables are upserted by key, so editing an entry here and reseeding
//! updates it in place.

use crate::models::{Service, ServiceCategory};

fn category(id: &str, name: &str, description: &str, icon: &str) -> ServiceCategory {
    ServiceCategory {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        icon: icon.to_string(),
    }
}

fn service(
    code: &str,
    name: &str,
    category_id: &str,
    price: i64,
    processing_days: u32,
    required_documents: &[&str],
    description: &str,
) -> Service {
    Service {
        code: code.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        category_id: category_id.to_string(),
        price,
        required_documents: required_documents.iter().map(|d| d.to_string()).collect(),
        processing_days,
    }
}

pub fn default_categories() -> Vec<ServiceCategory> {
    vec![
        category(
            "certificates",
            "Certificates",
            "Revenue department certificates issued by the Tahsildar",
            "file-badge",
        ),
        category(
            "bill-payments",
            "Bill Payments",
            "Electricity, water and property tax payments",
            "receipt",
        ),
        category(
            "registrations",
            "Registrations",
            "Birth, death and marriage registrations",
            "clipboard-list",
        ),
        category(
            "identity",
            "Identity Services",
            "Ration card and voter ID applications and corrections",
            "id-card",
        ),
        category(
            "welfare",
            "Welfare Schemes",
            "Pension and scholarship scheme applications",
            "hand-heart",
        ),
    ]
}

pub fn default_services() -> Vec<Service> {
    vec![
        service(
            "CERT-INCOME",
            "Income Certificate",
            "certificates",
            6000,
            7,
            &["Aadhaar card", "Salary slip or self declaration", "Ration card"],
            "Certificate of annual family income",
        ),
        service(
            "CERT-COMMUNITY",
            "Community Certificate",
            "certificates",
            6000,
            15,
            &["Aadhaar card", "Parent's community certificate", "School transfer certificate"],
            "Certificate of community for reservation benefits",
        ),
        service(
            "CERT-NATIVITY",
            "Nativity Certificate",
            "certificates",
            6000,
            15,
            &["Aadhaar card", "Proof of residence", "Birth certificate"],
            "Certificate of place of birth and residence",
        ),
        service(
            "CERT-FIRST-GRADUATE",
            "First Graduate Certificate",
            "certificates",
            6000,
            7,
            &["Aadhaar card", "Ration card", "Self declaration"],
            "Certificate that no family member holds a degree",
        ),
        service(
            "BILL-EB",
            "Electricity Bill Payment",
            "bill-payments",
            3000,
            1,
            &["Consumer number"],
            "Pay electricity dues with a service charge",
        ),
        service(
            "BILL-PROPERTY-TAX",
            "Property Tax Payment",
            "bill-payments",
            3000,
            1,
            &["Assessment number"],
            "Pay municipal property tax",
        ),
        service(
            "REG-BIRTH",
            "Birth Certificate",
            "registrations",
            10000,
            10,
            &["Hospital discharge summary", "Parents' Aadhaar cards"],
            "Registration extract for a birth",
        ),
        service(
            "REG-DEATH",
            "Death Certificate",
            "registrations",
            10000,
            10,
            &["Hospital or village officer report", "Applicant Aadhaar card"],
            "Registration extract for a death",
        ),
        service(
            "REG-MARRIAGE",
            "Marriage Registration",
            "registrations",
            20000,
            21,
            &["Wedding invitation", "Photographs", "Age proof of both parties", "Witness IDs"],
            "Registration of a solemnised marriage",
        ),
        service(
            "ID-RATION-CARD",
            "Smart Ration Card",
            "identity",
            0,
            30,
            &["Aadhaar cards of all members", "Address proof"],
            "New family smart card application",
        ),
        service(
            "ID-VOTER-CORRECTION",
            "Voter ID Correction",
            "identity",
            0,
            30,
            &["Existing voter ID", "Proof of correct details"],
            "Correct name, age or address on the electoral roll",
        ),
        service(
            "WEL-OLD-AGE-PENSION",
            "Old Age Pension",
            "welfare",
            0,
            45,
            &["Age proof", "Income certificate", "Bank passbook"],
            "Monthly pension for citizens over 60 without support",
        ),
    ]
}
