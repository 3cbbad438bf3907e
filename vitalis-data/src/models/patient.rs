use serde::{Deserialize, Serialize};

/// Storage model for a patient demographic record.
///
/// `cpf` is stored normalized (digits only) and is unique across the table.
/// Every attribute that the import source may omit is an `Option` with `None`
/// as the explicit absent value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    /// Row id
    pub id: i64,

    /// Full name
    pub name: String,

    /// Age in years
    pub age: Option<i64>,

    /// National identifier (CPF), digits only
    pub cpf: String,

    /// National document number (RG)
    pub rg: Option<String>,

    /// Birth date as given by the source (dd/mm/yyyy)
    pub birth_date: Option<String>,

    /// Sex
    pub sex: Option<String>,

    /// Astrological sign
    pub zodiac_sign: Option<String>,

    /// Mother's name
    pub mother_name: Option<String>,

    /// Father's name
    pub father_name: Option<String>,

    /// Email address
    pub email: Option<String>,

    /// Password as imported. Never exposed through the API.
    pub password: Option<String>,

    /// Postal code (CEP)
    pub postal_code: Option<String>,

    /// Street name
    pub street: Option<String>,

    /// Street number
    pub number: Option<i64>,

    /// Neighborhood
    pub neighborhood: Option<String>,

    /// City
    pub city: Option<String>,

    /// State abbreviation
    pub state: Option<String>,

    /// Landline phone number
    pub landline: Option<String>,

    /// Mobile phone number
    pub mobile: Option<String>,

    /// Height as given by the source (e.g. "1,96")
    pub height: Option<String>,

    /// Weight in kilograms
    pub weight: Option<i64>,

    /// Blood type
    pub blood_type: Option<String>,

    /// Ethnicity/color
    pub color: Option<String>,
}

/// Input data for inserting a patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPatient {
    pub name: String,
    pub age: Option<i64>,
    pub cpf: String,
    pub rg: Option<String>,
    pub birth_date: Option<String>,
    pub sex: Option<String>,
    pub zodiac_sign: Option<String>,
    pub mother_name: Option<String>,
    pub father_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub postal_code: Option<String>,
    pub street: Option<String>,
    pub number: Option<i64>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub landline: Option<String>,
    pub mobile: Option<String>,
    pub height: Option<String>,
    pub weight: Option<i64>,
    pub blood_type: Option<String>,
    pub color: Option<String>,
}

impl NewPatient {
    /// Create a record with the two mandatory attributes set and every
    /// optional attribute explicitly absent.
    pub fn new(name: impl Into<String>, cpf: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            age: None,
            cpf: cpf.into(),
            rg: None,
            birth_date: None,
            sex: None,
            zodiac_sign: None,
            mother_name: None,
            father_name: None,
            email: None,
            password: None,
            postal_code: None,
            street: None,
            number: None,
            neighborhood: None,
            city: None,
            state: None,
            landline: None,
            mobile: None,
            height: None,
            weight: None,
            blood_type: None,
            color: None,
        }
    }
}
