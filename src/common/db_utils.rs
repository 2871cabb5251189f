// src/common/db_utils.rs

use sqlx::PgPool;

use crate::common::error::AppError;

/// Escapa os curingas do LIKE para que a busca livre seja tratada como texto literal.
pub(crate) fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Padrão "contém" para ILIKE/LIKE, já escapado.
pub(crate) fn contains_pattern(input: &str) -> String {
    format!("%{}%", escape_like(input))
}

/// Verificação de vida do banco usada pelo /api/health.
pub async fn ping(pool: &PgPool) -> Result<(), AppError> {
    let (ok,): (i32,) = sqlx::query_as("SELECT 1").fetch_one(pool).await?;
    if ok == 1 {
        Ok(())
    } else {
        Err(AppError::StorageUnavailable("SELECT 1 retornou valor inesperado".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("100%_off\\"), "100\\%\\_off\\\\");
        assert_eq!(contains_pattern("maria"), "%maria%");
    }
}
