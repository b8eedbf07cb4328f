use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// エンティティ識別子に要求される制約
pub trait EntityId:
    Clone + Eq + Hash + fmt::Debug + fmt::Display + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

impl<T> EntityId for T where
    T: Clone + Eq + Hash + fmt::Debug + fmt::Display + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

#[derive(Error, Debug, PartialEq)]
pub enum EntityError {
    #[error("Identifier already assigned: {current} (attempted {attempted})")]
    IdentifierAlreadyAssigned { current: String, attempted: String },

    #[error("Entity has no identifier")]
    MissingIdentifier,
}

/// 主キーを持つ永続化レコードの基底部分
///
/// 主キーは自動採番されない。永続化前に呼び出し側が値を設定する。
/// 各レコードはこの構造体をフィールドとして埋め込む。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "ID: EntityId")]
pub struct AbstractEntity<ID: EntityId> {
    /// 主キー（未設定なら一時的なインスタンス）
    id: Option<ID>,
}

impl<ID: EntityId> AbstractEntity<ID> {
    /// 識別子未設定の一時的なインスタンスを作成する
    pub fn transient() -> Self {
        Self { id: None }
    }

    /// 識別子を設定済みのインスタンスを作成する
    pub fn with_id(id: ID) -> Self {
        Self { id: Some(id) }
    }

    pub fn id(&self) -> Option<&ID> {
        self.id.as_ref()
    }

    /// 識別子を設定する。一度設定した識別子は変更できない
    pub fn assign_id(&mut self, id: ID) -> Result<(), EntityError> {
        match &self.id {
            Some(current) if *current == id => Ok(()),
            Some(current) => Err(EntityError::IdentifierAlreadyAssigned {
                current: current.to_string(),
                attempted: id.to_string(),
            }),
            None => {
                self.id = Some(id);
                Ok(())
            }
        }
    }

    /// 永続化に必要な識別子を取得する
    pub fn require_id(&self) -> Result<&ID, EntityError> {
        self.id.as_ref().ok_or(EntityError::MissingIdentifier)
    }

    pub fn is_transient(&self) -> bool {
        self.id.is_none()
    }
}

impl<ID: EntityId> Default for AbstractEntity<ID> {
    fn default() -> Self {
        Self::transient()
    }
}

// 両方の識別子が設定済みで等しい場合のみ等価
impl<ID: EntityId> PartialEq for AbstractEntity<ID> {
    fn eq(&self, other: &Self) -> bool {
        same_identity(self.id.as_ref(), other.id.as_ref())
    }
}

impl<ID: EntityId> Hash for AbstractEntity<ID> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<ID: EntityId> fmt::Display for AbstractEntity<ID> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "AbstractEntity(id={})", id),
            None => write!(f, "AbstractEntity(id=null)"),
        }
    }
}

/// 識別子同士の同一性判定
pub fn same_identity<ID: PartialEq>(left: Option<&ID>, right: Option<&ID>) -> bool {
    matches!((left, right), (Some(l), Some(r)) if l == r)
}

/// 識別子を持つ永続化レコードの能力
pub trait Entity {
    type Id: EntityId;

    fn base(&self) -> &AbstractEntity<Self::Id>;

    fn id(&self) -> Option<&Self::Id> {
        self.base().id()
    }

    fn is_persistent(&self) -> bool {
        !self.base().is_transient()
    }

    /// 識別子のみで同一性を判定する
    fn same_identity(&self, other: &Self) -> bool {
        self.base() == other.base()
    }
}
