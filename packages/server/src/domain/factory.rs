//! セッションコードの生成

use std::ops::RangeInclusive;

use rand::Rng;

use super::{error::ValueObjectError, value_object::SessionCode};

/// 生成するコードの範囲
pub const SESSION_CODE_RANGE: RangeInclusive<u32> = 100_000..=999_999;

/// セッションコードの Factory
pub struct SessionCodeFactory;

impl SessionCodeFactory {
    /// 疑似乱数で 6 桁のセッションコードを生成
    pub fn generate() -> Result<SessionCode, ValueObjectError> {
        let value = rand::thread_rng().gen_range(SESSION_CODE_RANGE);
        SessionCode::from_number(value)
    }
}

/// コード生成の抽象化
///
/// Repository はこの trait を通してコードを払い出す。
/// テストでは決まった順序でコードを返す実装に差し替えて衝突を再現する。
pub trait CodeGenerator: Send + Sync {
    fn next_code(&self) -> Result<SessionCode, ValueObjectError>;
}

/// `SessionCodeFactory` を使う CodeGenerator 実装
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomCodeGenerator;

impl CodeGenerator for RandomCodeGenerator {
    fn next_code(&self) -> Result<SessionCode, ValueObjectError> {
        SessionCodeFactory::generate()
    }
}
