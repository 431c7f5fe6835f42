//! 데이터셋 식별자.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

use crate::error::{DataError, Result};

const MAX_COMPONENT_LEN: usize = 100;

/// 다른 데이터셋의 청크 파일이나 매니페스트와 이름이 겹치는 데이터셋 이름.
static RESERVED_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:_part\d+|_metadata)$").expect("reserved name pattern is valid"));

/// `(운용사, 데이터셋 이름)` 쌍.
///
/// 두 값 모두 파일 경로의 일부가 되므로 생성 시 검증합니다.
/// 운용사 이름은 소문자로 정규화됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DatasetKey {
    provider: String,
    name: String,
}

impl DatasetKey {
    pub fn new(provider: impl AsRef<str>, name: impl AsRef<str>) -> Result<Self> {
        let provider = provider.as_ref();
        let name = name.as_ref();
        validate_component("provider", provider)?;
        validate_component("dataset name", name)?;
        if RESERVED_NAME.is_match(name) {
            return Err(DataError::InvalidKey(format!(
                "dataset name '{}' may not end with '_part<N>' or '_metadata'",
                name
            )));
        }

        Ok(Self {
            provider: provider.to_lowercase(),
            name: name.to_string(),
        })
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for DatasetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.provider, self.name)
    }
}

/// 경로 구성 요소 검증.
///
/// 1-100자, 첫 글자는 영숫자, 이후 영숫자/`_`/`-`/공백만 허용합니다.
pub fn validate_component(kind: &str, value: &str) -> Result<()> {
    let len = value.chars().count();
    if len == 0 || len > MAX_COMPONENT_LEN {
        return Err(DataError::InvalidKey(format!(
            "{} must be 1-{} characters, got {}",
            kind, MAX_COMPONENT_LEN, len
        )));
    }

    let mut chars = value.chars();
    let first_ok = chars.next().is_some_and(|c| c.is_ascii_alphanumeric());
    let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ' '));

    if !first_ok || !rest_ok {
        return Err(DataError::InvalidKey(format!(
            "{} '{}' contains invalid characters",
            kind, value
        )));
    }

    Ok(())
}
