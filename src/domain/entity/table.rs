use crate::domain::entity::abstract_entity::{AbstractEntity, Entity, EntityError};
use garde::Validate;
use serde::{Deserialize, Serialize};

/// Tableの主キー型
pub type TableId = i32;

pub const NAME_MAX_CHARS: usize = 255;
pub const DESCRIPTION_MAX_CHARS: usize = 1024;

/// Tableの永続化レコード
#[derive(Debug, Clone)]
pub struct TableEntity {
    base: AbstractEntity<TableId>,

    pub name: String,

    pub description: Option<String>,
}

impl TableEntity {
    /// 識別子未設定のレコードを作成リクエストから作成する
    pub fn from_request(request: CreateTableRequest) -> Self {
        Self {
            base: AbstractEntity::transient(),
            name: request.name,
            description: request.description,
        }
    }

    pub fn assign_id(&mut self, id: TableId) -> Result<(), EntityError> {
        self.base.assign_id(id)
    }

    /// 更新リクエストを適用する（指定されたフィールドのみ上書き）
    pub fn apply(&mut self, request: UpdateTableRequest) {
        if let Some(name) = request.name {
            self.name = name;
        }
        if let Some(description) = request.description {
            self.description = Some(description);
        }
    }

    /// リソースビューに変換する
    pub fn to_view(&self) -> Result<Table, EntityError> {
        Ok(Table {
            id: *self.base.require_id()?,
            name: self.name.clone(),
            description: self.description.clone(),
        })
    }
}

impl Entity for TableEntity {
    type Id = TableId;

    fn base(&self) -> &AbstractEntity<TableId> {
        &self.base
    }
}

impl PartialEq for TableEntity {
    fn eq(&self, other: &Self) -> bool {
        self.same_identity(other)
    }
}

/// HTTPで返すTableのリソースビュー
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub id: TableId,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Table作成リクエスト
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTableRequest {
    #[garde(length(chars, min = 1, max = 255), custom(not_blank))]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[garde(length(chars, max = 1024))]
    pub description: Option<String>,
}

impl CreateTableRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Table更新リクエスト
///
/// 指定されたフィールドのみ上書きし、省略されたフィールドは保存済みの値を保持する。
/// `"description": null`は省略と同じ扱いで、保存済みの説明は消去されない。
/// ボディに含まれる`id`は無視され、パスの識別子が優先される。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTableRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[garde(length(chars, min = 1, max = 255), custom(optional_not_blank))]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[garde(length(chars, max = 1024))]
    pub description: Option<String>,
}

impl UpdateTableRequest {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            description: None,
        }
    }

    pub fn description(description: impl Into<String>) -> Self {
        Self {
            name: None,
            description: Some(description.into()),
        }
    }
}

fn not_blank(value: &str, _ctx: &()) -> garde::Result {
    if value.trim().is_empty() {
        return Err(garde::Error::new("must not be blank"));
    }
    Ok(())
}

fn optional_not_blank(value: &Option<String>, ctx: &()) -> garde::Result {
    match value {
        Some(v) => not_blank(v, ctx),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn view_serializes_without_absent_description() {
        let mut entity = TableEntity::from_request(CreateTableRequest::new("alpha"));
        entity.assign_id(1).unwrap();

        let json = serde_json::to_value(entity.to_view().unwrap()).unwrap();
        assert_eq!(json, serde_json::json!({"id": 1, "name": "alpha"}));
    }

    #[test]
    fn transient_entity_has_no_view() {
        let entity = TableEntity::from_request(CreateTableRequest::new("alpha"));
        assert_eq!(entity.to_view(), Err(EntityError::MissingIdentifier));
    }

    #[test]
    fn apply_keeps_omitted_fields() {
        let mut entity = TableEntity::from_request(
            CreateTableRequest::new("alpha").with_description("window seat"),
        );
        entity.apply(UpdateTableRequest::name("beta"));
        assert_eq!(entity.name, "beta");
        assert_eq!(entity.description.as_deref(), Some("window seat"));

        entity.apply(UpdateTableRequest::description("patio"));
        assert_eq!(entity.name, "beta");
        assert_eq!(entity.description.as_deref(), Some("patio"));
    }

    #[test]
    fn null_description_does_not_clear() {
        let mut entity = TableEntity::from_request(
            CreateTableRequest::new("alpha").with_description("window seat"),
        );
        let request: UpdateTableRequest =
            serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert_eq!(request, UpdateTableRequest::default());

        entity.apply(request);
        assert_eq!(entity.description.as_deref(), Some("window seat"));
    }

    #[test]
    fn entities_compare_by_identifier_only() {
        let mut a = TableEntity::from_request(CreateTableRequest::new("alpha"));
        let mut b = TableEntity::from_request(CreateTableRequest::new("beta"));
        assert_ne!(a, b);
        a.assign_id(3).unwrap();
        b.assign_id(3).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn update_request_ignores_body_id() {
        let request: UpdateTableRequest =
            serde_json::from_str(r#"{"id": 99, "name": "beta"}"#).unwrap();
        assert_eq!(request, UpdateTableRequest::name("beta"));
    }

    #[test_case("alpha".to_string(), true ; "plain name")]
    #[test_case(String::new(), false ; "empty name")]
    #[test_case("   ".to_string(), false ; "blank name")]
    #[test_case("x".repeat(NAME_MAX_CHARS), true ; "name at limit")]
    #[test_case("x".repeat(NAME_MAX_CHARS + 1), false ; "name over limit")]
    fn create_request_name_rules(name: String, valid: bool) {
        assert_eq!(CreateTableRequest::new(name).validate().is_ok(), valid);
    }

    #[test]
    fn update_request_validates_present_fields_only() {
        assert!(UpdateTableRequest::default().validate().is_ok());
        assert!(UpdateTableRequest::name(" ").validate().is_err());
        let long = UpdateTableRequest {
            name: None,
            description: Some("d".repeat(DESCRIPTION_MAX_CHARS + 1)),
        };
        assert!(long.validate().is_err());
    }
}
