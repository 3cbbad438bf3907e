use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use vitalis_data::models::Patient;

/// Patient record as served by the API.
///
/// Same shape as the storage model minus the password column, which is never
/// exposed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PatientResponse {
    pub name: String,
    pub age: Option<i64>,

    /// National identifier, digits only
    #[schema(example = "97464252420")]
    pub cpf: String,

    pub rg: Option<String>,
    pub birth_date: Option<String>,
    pub sex: Option<String>,
    pub zodiac_sign: Option<String>,
    pub mother_name: Option<String>,
    pub father_name: Option<String>,
    pub email: Option<String>,
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

impl From<Patient> for PatientResponse {
    fn from(p: Patient) -> Self {
        Self {
            name: p.name,
            age: p.age,
            cpf: p.cpf,
            rg: p.rg,
            birth_date: p.birth_date,
            sex: p.sex,
            zodiac_sign: p.zodiac_sign,
            mother_name: p.mother_name,
            father_name: p.father_name,
            email: p.email,
            postal_code: p.postal_code,
            street: p.street,
            number: p.number,
            neighborhood: p.neighborhood,
            city: p.city,
            state: p.state,
            landline: p.landline,
            mobile: p.mobile,
            height: p.height,
            weight: p.weight,
            blood_type: p.blood_type,
            color: p.color,
        }
    }
}
