use super::*;
use serde_json::{from_str, to_string};

#[test]
fn test_access_level_value_is_transparent() {
    let json_str = to_string(&AccessLevelValue::DEVELOPER).expect("Failed to serialize");
    assert_eq!(json_str, "30");

    let level: AccessLevelValue = from_str("40").expect("Failed to deserialize");
    assert_eq!(level, AccessLevelValue::MAINTAINER);
}

#[test]
fn test_access_level_value_display() {
    assert_eq!(AccessLevelValue::MAINTAINER.to_string(), "Maintainer (40)");
    assert_eq!(AccessLevelValue(42).to_string(), "42");
    assert_eq!(AccessLevelValue(42).role_name(), None);
}

#[test]
fn test_branch_access_description_null_ids_decode_to_zero() {
    let json_str = r#"{
        "id": 7,
        "access_level": 40,
        "access_level_description": "Maintainers",
        "user_id": null,
        "group_id": null
    }"#;

    let access: BranchAccessDescription =
        from_str(json_str).expect("Failed to deserialize BranchAccessDescription");

    assert_eq!(access.id, 7);
    assert_eq!(access.access_level, AccessLevelValue::MAINTAINER);
    assert_eq!(access.access_level_description, "Maintainers");
    assert_eq!(access.user_id, 0);
    assert_eq!(access.group_id, 0);
}

#[test]
fn test_branch_access_description_with_user() {
    let json_str = r#"{
        "id": 8,
        "access_level": 30,
        "access_level_description": "Jane Doe",
        "user_id": 101,
        "group_id": null
    }"#;

    let access: BranchAccessDescription = from_str(json_str).expect("Failed to deserialize");

    assert_eq!(access.user_id, 101);
    assert_eq!(access.group_id, 0);
}

#[test]
fn test_protected_branch_deserialization() {
    let json_str = r#"{
        "id": 1,
        "name": "main",
        "push_access_levels": [
            {"id": 3, "access_level": 40, "access_level_description": "Maintainers", "user_id": null, "group_id": null},
            {"id": 2, "access_level": 30, "access_level_description": "Deploy key", "user_id": 12, "group_id": null}
        ],
        "merge_access_levels": null,
        "allow_force_push": true,
        "code_owner_approval_required": false
    }"#;

    let branch: ProtectedBranch = from_str(json_str).expect("Failed to deserialize ProtectedBranch");

    assert_eq!(branch.id, 1);
    assert_eq!(branch.name, "main");
    assert_eq!(branch.push_access_levels.len(), 2);
    assert_eq!(branch.push_access_levels[1].access_level_description, "Deploy key");
    assert!(branch.merge_access_levels.is_empty());
    assert!(branch.unprotect_access_levels.is_empty());
    assert!(branch.allow_force_push);
    assert!(!branch.code_owner_approval_required);
}

#[test]
fn test_protected_branch_minimal_deserialization() {
    let branch: ProtectedBranch =
        from_str(r#"{"id": 5, "name": "release/*"}"#).expect("Failed to deserialize");

    assert_eq!(branch.name, "release/*");
    assert!(!branch.allow_force_push);
    assert!(!branch.code_owner_approval_required);
    assert!(branch.push_access_levels.is_empty());
}
