use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use vitalis_data::models::NewPatient;
use vitalis_data::repository::PatientRepositoryTrait;

use crate::cpf;
use super::ImportError;

/// One record of the patient source collection. Field names follow the
/// source file; only name and cpf are required.
#[derive(Debug, Clone, Deserialize)]
pub struct PatientRecord {
    pub nome: String,
    pub cpf: String,
    pub idade: Option<i64>,
    pub rg: Option<String>,
    pub data_nasc: Option<String>,
    pub sexo: Option<String>,
    pub signo: Option<String>,
    pub mae: Option<String>,
    pub pai: Option<String>,
    pub email: Option<String>,
    pub senha: Option<String>,
    pub cep: Option<String>,
    pub endereco: Option<String>,
    pub numero: Option<i64>,
    pub bairro: Option<String>,
    pub cidade: Option<String>,
    pub estado: Option<String>,
    pub telefone_fixo: Option<String>,
    pub celular: Option<String>,
    pub altura: Option<String>,
    pub peso: Option<i64>,
    pub tipo_sanguineo: Option<String>,
    pub cor: Option<String>,
}

impl From<PatientRecord> for NewPatient {
    fn from(r: PatientRecord) -> Self {
        NewPatient {
            name: r.nome,
            age: r.idade,
            cpf: cpf::normalize(&r.cpf),
            rg: r.rg,
            birth_date: r.data_nasc,
            sex: r.sexo,
            zodiac_sign: r.signo,
            mother_name: r.mae,
            father_name: r.pai,
            email: r.email,
            password: r.senha,
            postal_code: r.cep,
            street: r.endereco,
            number: r.numero,
            neighborhood: r.bairro,
            city: r.cidade,
            state: r.estado,
            landline: r.telefone_fixo,
            mobile: r.celular,
            height: r.altura,
            weight: r.peso,
            blood_type: r.tipo_sanguineo,
            color: r.cor,
        }
    }
}

/// Counters for the patient pass
#[derive(Debug, Clone, Copy)]
pub struct PatientImportStats {
    /// Records inserted
    pub inserted: usize,
    /// Records whose cpf was already present
    pub skipped: usize,
}

/// Import the patient collection in a single committed batch.
///
/// Identifiers are normalized up front; records whose cpf already exists are
/// skipped without touching the stored row. Any failure aborts the whole
/// batch.
pub async fn import_patients(
    path: &Path,
    repository: &dyn PatientRepositoryTrait,
) -> Result<PatientImportStats, ImportError> {
    info!("Importing patients from {:?}", path);

    let file = File::open(path)?;
    let records: Vec<PatientRecord> = serde_json::from_reader(BufReader::new(file))?;
    let total = records.len();

    let batch: Vec<NewPatient> = records.into_iter().map(NewPatient::from).collect();

    let inserted = repository
        .insert_batch(&batch)
        .await
        .map_err(|e| ImportError::Repository(e.to_string()))?;

    Ok(PatientImportStats {
        inserted,
        skipped: total - inserted,
    })
}
