//! Port interface for the academic profile fetcher (C4).

use async_trait::async_trait;
use pulsearc_domain::SyncResult;
use serde::{Deserialize, Serialize};

/// The caller's student record, as returned by the portal's profile
/// endpoint. Unknown fields in the upstream payload are ignored for forward
/// compatibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcademicData {
    pub id: String,
    pub matricula: String,
    #[serde(rename = "codAluno")]
    pub cod_aluno: String,
    #[serde(rename = "nomeAluno")]
    pub nome_aluno: String,
    #[serde(rename = "codCurso")]
    pub cod_curso: String,
    #[serde(rename = "nomeCurso")]
    pub nome_curso: String,
    pub turma: String,
    pub serie: String,
    pub ano: String,
    pub semestre: String,
}

/// Retrieves a student's academic record from the portal.
#[async_trait]
pub trait AcademicProfileFetcher: Send + Sync {
    /// Fetch `/alunos/user/{portal_id}`. The response is a paged envelope;
    /// the profile is the first element of `content`. Returns `None` if
    /// `content` is absent or empty.
    async fn get_academic_data(&self, portal_id: &str) -> SyncResult<Option<AcademicData>>;
}
