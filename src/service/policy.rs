use crate::db::sqlite::AccountsStorage;
use crate::error::ProfileError;
use crate::service::ports::AccountPolicy;

pub const NICKNAME_RULE_MESSAGE: &str =
    "닉네임은 5자 이상 10자 이하, 영문자,숫자,한글만 사용할 수 있습니다.";
pub const PASSWORD_RULE_MESSAGE: &str =
    "비밀번호는 8자 이상 20자 이하, 영문자,숫자,특수문자를 포함해야합니다.";
pub const NICKNAME_TAKEN_MESSAGE: &str = "이미 존재하는 닉네임입니다.";

const NICKNAME_LEN: std::ops::RangeInclusive<usize> = 5..=10;
const PASSWORD_LEN: std::ops::RangeInclusive<usize> = 8..=20;

fn is_hangul_syllable(c: char) -> bool {
    ('가'..='힣').contains(&c)
}

/// 5-10 characters of ASCII letters, digits or Hangul syllables.
pub fn is_valid_nickname(nickname: &str) -> bool {
    NICKNAME_LEN.contains(&nickname.chars().count())
        && nickname
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || is_hangul_syllable(c))
}

/// 8-20 ASCII characters with at least one letter, digit and punctuation mark.
pub fn is_valid_password(password: &str) -> bool {
    PASSWORD_LEN.contains(&password.chars().count())
        && password.chars().all(|c| c.is_ascii_graphic())
        && password.chars().any(|c| c.is_ascii_alphabetic())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| c.is_ascii_punctuation())
}

pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
}

/// Account rules backed by the accounts table.
#[derive(Clone)]
pub struct AccountRules {
    accounts: AccountsStorage,
}

impl AccountRules {
    pub fn new(accounts: AccountsStorage) -> Self {
        Self { accounts }
    }
}

impl AccountPolicy for AccountRules {
    fn is_valid_nickname(&self, nickname: &str) -> bool {
        is_valid_nickname(nickname)
    }

    fn is_valid_password(&self, password: &str) -> bool {
        is_valid_password(password)
    }

    async fn is_nickname_taken(&self, nickname: &str) -> Result<bool, ProfileError> {
        self.accounts.nickname_exists(nickname).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nickname_rules() {
        assert!(is_valid_nickname("abcde"));
        assert!(is_valid_nickname("홍길동1234"));
        assert!(is_valid_nickname("abcdefghij"));
        assert!(!is_valid_nickname("abcd"));
        assert!(!is_valid_nickname("abcdefghijk"));
        assert!(!is_valid_nickname("abc de"));
        assert!(!is_valid_nickname("abc_de"));
        assert!(!is_valid_nickname("ㄱㄴㄷㄹㅁ"));
    }

    #[test]
    fn password_rules() {
        assert!(is_valid_password("abc123!!"));
        assert!(is_valid_password("Passw0rd#2024"));
        assert!(!is_valid_password("abc12!"));
        assert!(!is_valid_password("abcdefgh1"));
        assert!(!is_valid_password("abcdefgh!"));
        assert!(!is_valid_password("12345678!"));
        assert!(!is_valid_password("abc 123 !!"));
        assert!(!is_valid_password("a1!a1!a1!a1!a1!a1!a1!"));
    }

    #[test]
    fn email_rules() {
        assert!(is_valid_email("a@x.com"));
        assert!(!is_valid_email("a@xcom"));
        assert!(!is_valid_email("@x.com"));
        assert!(!is_valid_email("a@@x.com"));
        assert!(!is_valid_email("a b@x.com"));
    }
}
