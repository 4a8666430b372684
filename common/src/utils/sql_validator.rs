//! SQL statement and identifier validation.
//!
//! Two separate guards live here. [`SqlValidator::validate_read_only`] is the
//! route-level check for ad-hoc report queries; it is a best-effort filter,
//! not a sandbox, and the database account should still be read-only.
//! [`SqlValidator::validate_identifier`] protects the catalog queries that
//! must embed a table name directly in SQL text.

use sqlparser::dialect::GenericDialect;
use sqlparser::keywords::Keyword;
use sqlparser::tokenizer::{Token, Tokenizer, Word};

use crate::errors::AppError;

/// Validates SQL statements for security.
pub struct SqlValidator;

/// Longest identifier accepted by any supported engine (SQL Server: 128).
const MAX_IDENTIFIER_LEN: usize = 128;

impl SqlValidator {
    /// Accepts exactly one `SELECT` statement.
    ///
    /// The statement is tokenized first, so string literals, quoted
    /// identifiers and comments never trip a rule. A single trailing `;` is
    /// tolerated. `SELECT ... INTO` is rejected because it creates a table.
    ///
    /// # Errors
    /// Returns `AppError::UnsafeSql` describing the first violated rule.
    pub fn validate_read_only(sql: &str) -> Result<(), AppError> {
        let tokens = Tokenizer::new(&GenericDialect {}, sql)
            .tokenize()
            .map_err(|e| AppError::UnsafeSql(format!("unreadable statement: {e}")))?;

        let mut code: Vec<&Token> = tokens
            .iter()
            .filter(|t| !matches!(t, Token::Whitespace(_) | Token::EOF))
            .collect();
        if matches!(code.last(), Some(Token::SemiColon)) {
            code.pop();
        }

        let Some(first) = code.first() else {
            return Err(AppError::UnsafeSql("empty statement".into()));
        };
        if code.iter().any(|t| matches!(t, Token::SemiColon)) {
            return Err(AppError::UnsafeSql("multiple statements are not allowed".into()));
        }
        if !is_keyword(first, Keyword::SELECT) {
            return Err(AppError::UnsafeSql("only SELECT queries are allowed".into()));
        }
        if code.iter().any(|t| is_keyword(t, Keyword::INTO)) {
            return Err(AppError::UnsafeSql("SELECT ... INTO is not allowed".into()));
        }
        Ok(())
    }

    /// Accepts `[A-Za-z_][A-Za-z0-9_$]*` up to 128 characters.
    ///
    /// # Errors
    /// Returns `AppError::InvalidIdentifier` for anything else.
    pub fn validate_identifier(name: &str) -> Result<(), AppError> {
        let mut chars = name.chars();
        let valid_start = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');

        if valid_start && valid_rest && name.len() <= MAX_IDENTIFIER_LEN {
            Ok(())
        } else {
            Err(AppError::InvalidIdentifier(name.to_string()))
        }
    }
}

/// Unquoted word matching `keyword`.
fn is_keyword(token: &Token, keyword: Keyword) -> bool {
    matches!(token, Token::Word(Word { keyword: k, quote_style: None, .. }) if *k == keyword)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_is_allowed() {
        assert!(SqlValidator::validate_read_only("SELECT * FROM users").is_ok());
        assert!(SqlValidator::validate_read_only("  select id from sales;  ").is_ok());
        assert!(SqlValidator::validate_read_only("SELECT(1)").is_ok());
    }

    #[test]
    fn test_non_select_is_rejected() {
        assert!(SqlValidator::validate_read_only("INSERT INTO users VALUES (1)").is_err());
        assert!(SqlValidator::validate_read_only("selector").is_err());
        assert!(SqlValidator::validate_read_only("   ").is_err());
    }

    #[test]
    fn test_stacked_statements_are_rejected() {
        let err = SqlValidator::validate_read_only("SELECT 1; DROP TABLE users").unwrap_err();
        assert!(err.to_string().contains("multiple statements"));
    }

    #[test]
    fn test_select_into_is_rejected() {
        assert!(SqlValidator::validate_read_only("SELECT *\nINTO backup FROM users").is_err());
        assert!(SqlValidator::validate_read_only("select id into #tmp from sales").is_err());
    }

    #[test]
    fn test_keywords_inside_literals_and_names_are_ignored() {
        for sql in [
            "SELECT * FROM employees WHERE last_name = 'Walter Smith'",
            "SELECT salter FROM t",
            "SELECT * FROM audit WHERE action = 'DROP INDEX'",
            "SELECT * FROM audit WHERE note = 'a;b' ORDER BY id;",
            "SELECT into_date, \"into\" FROM t",
            "SELECT id FROM sales -- DELETE FROM sales; later\n",
            "SELECT 'it''s' AS phrase /* ; */",
        ] {
            assert!(SqlValidator::validate_read_only(sql).is_ok(), "{sql}");
        }
    }

    #[test]
    fn test_unterminated_literal_is_rejected() {
        assert!(SqlValidator::validate_read_only("SELECT 'abc FROM t").is_err());
    }

    #[test]
    fn test_identifier_charset() {
        assert!(SqlValidator::validate_identifier("employees").is_ok());
        assert!(SqlValidator::validate_identifier("_tmp$1").is_ok());
        assert!(SqlValidator::validate_identifier("1abc").is_err());
        assert!(SqlValidator::validate_identifier("users; DROP TABLE x").is_err());
        assert!(SqlValidator::validate_identifier("na\"me").is_err());
        assert!(SqlValidator::validate_identifier("").is_err());
        assert!(SqlValidator::validate_identifier(&"a".repeat(129)).is_err());
    }
}
