//! セッションのポリシー定義
//!
//! - `ReceiverCapacity`: 1 セッションに参加できる受信者数
//! - `CollisionPolicy`: コード生成時に稼働中のコードと衝突した場合の扱い

use std::num::NonZeroUsize;

/// 受信者の参加上限
///
/// `Unlimited` が複数受信者ポリシー、`Limited(1)` が単一受信者ポリシーに相当する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReceiverCapacity {
    #[default]
    Unlimited,
    Limited(NonZeroUsize),
}

impl ReceiverCapacity {
    /// 単一受信者ポリシー
    pub fn single() -> Self {
        Self::Limited(NonZeroUsize::MIN)
    }

    /// 上限値から作成（`None` は上限なし）
    pub fn from_limit(limit: Option<NonZeroUsize>) -> Self {
        limit.map_or(Self::Unlimited, Self::Limited)
    }

    /// 現在の受信者数 `current` に対して、もう 1 人追加できるか
    pub fn allows(&self, current: usize) -> bool {
        match self {
            Self::Unlimited => true,
            Self::Limited(limit) => current < limit.get(),
        }
    }

    pub fn limit(&self) -> Option<usize> {
        match self {
            Self::Unlimited => None,
            Self::Limited(limit) => Some(limit.get()),
        }
    }
}

/// コード衝突時の扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionPolicy {
    /// 新しいセッションが既存のセッションを置き換える
    #[default]
    Replace,
    /// 空いているコードが出るまで再生成する
    Reroll,
}
