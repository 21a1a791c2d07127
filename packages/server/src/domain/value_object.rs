//! 値オブジェクト定義
//!
//! ドメインで扱う識別子・メタデータを型として表現します。
//! 不正な値はコンストラクタで弾くため、生成済みのインスタンスは常に有効です。

use std::fmt;

use uuid::Uuid;

use super::error::ValueObjectError;

/// セッションコードの桁数
pub const SESSION_CODE_LENGTH: usize = 6;

/// セッションコード（6 桁の数字文字列、先頭ゼロを保持）
///
/// 送信者と受信者が共有する唯一の秘密情報。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionCode(String);

impl SessionCode {
    /// 文字列から SessionCode を作成
    ///
    /// `^\d{6}$` に一致しない場合はエラーを返す。
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.len() != SESSION_CODE_LENGTH || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValueObjectError::InvalidSessionCode(value));
        }
        Ok(Self(value))
    }

    /// 数値から SessionCode を作成（6 桁にゼロ埋め）
    pub fn from_number(value: u32) -> Result<Self, ValueObjectError> {
        if value > 999_999 {
            return Err(ValueObjectError::InvalidSessionCode(value.to_string()));
        }
        Ok(Self(format!("{:06}", value)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for SessionCode {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for SessionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 接続 ID（トランスポート層が WebSocket ごとに割り当てる）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// 新しい接続 ID を生成（UUID v4）
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// 文字列表現から ConnectionId を復元
    pub fn parse(value: &str) -> Result<Self, ValueObjectError> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|_| ValueObjectError::InvalidConnectionId(value.to_string()))
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// 転送するファイルの記述子（名前とバイトサイズ）
///
/// 送信者がセッション作成時に渡し、参加する受信者全員にそのまま渡される。
/// ブローカーは中身を解釈しない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    pub name: String,
    pub size: u64,
}

impl FileDescriptor {
    pub fn new(name: String, size: u64) -> Self {
        Self { name, size }
    }
}

/// Unix タイムスタンプ（ミリ秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

/// セッション内での接続の役割
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Sender,
    Receiver,
}

/// 中継するシグナリングメッセージの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SignalKind::Offer => "offer",
            SignalKind::Answer => "answer",
            SignalKind::IceCandidate => "ice candidate",
        };
        f.write_str(name)
    }
}
