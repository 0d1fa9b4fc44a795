//! Upload, merge, clean, and list through a shared service.

use std::sync::Arc;

use serde_json::Value;

use tabletalk_core::config::TableTalkConfig;
use tabletalk_core::types::{JoinMode, TableKind};
use tabletalk_engine::MergeRequest;
use tabletalk_storage::{MemoryTableStore, TableService, TableStore};

#[test]
fn test_full_flow_over_shared_store() {
    let store = Arc::new(MemoryTableStore::new());
    let svc = TableService::new(Arc::clone(&store), &TableTalkConfig::default());

    let employees = svc
        .upload("id,name,dept\n1,Ann,ops\n2,Bo,eng\n3,Cy,eng\n", Some("Employees"))
        .unwrap();
    let payroll = svc
        .upload("emp_id,salary,dept\n1,50000,ops\n3,,eng\n4,70000,eng\n", Some("Payroll"))
        .unwrap();

    let request = MergeRequest::new("Staff")
        .join(JoinMode::Outer)
        .on("id", "emp_id");
    let merged = svc
        .merge(&[employees.id.clone(), payroll.id.clone()], &request)
        .unwrap();
    assert_eq!(merged.kind, TableKind::Merged);
    assert_eq!(merged.row_count(), 4);
    assert!(merged.has_column("Payroll_dept"));

    // The store seen through the Arc holds all three tables in order.
    let names: Vec<String> = store.list().unwrap().into_iter().map(|t| t.name).collect();
    assert_eq!(names, vec!["Employees", "Payroll", "Staff"]);

    let cleaned = svc.clean_table(&merged.id).unwrap();
    assert!(cleaned
        .rows()
        .iter()
        .all(|row| row.len() == cleaned.columns.len() && row.values().all(|v| !v.is_null())));

    let json: Value = serde_json::to_value(svc.get(&merged.id).unwrap()).unwrap();
    assert_eq!(json["type"], "merged");
    assert_eq!(json["rowCount"], 4);
    assert_eq!(json["parentTables"][0], employees.id.as_str());
    assert!(json["lastAccessed"].is_string());
}
