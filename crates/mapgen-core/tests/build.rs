//! End-to-end tests for building table contexts from a mapping workbook.

use mapgen_config::{Config, PredefinedSourceField, parse_config};
use mapgen_core::{
    RandomNameGenerator, RunOptions, RunReport, SequentialNameGenerator, TableOutcome, run,
    run_from_reader,
};
use mapgen_ingest::{CsvWorkbook, IngestError, MappingWorkbook};
use mapgen_model::{DataCaptureMode, FieldMapKind, MappingError, TableMapping, WarningKind};

const CONFIG: &str = r#"
[datatypes]
source = ["string", "bigint", "decimal", "timestamp"]
target = ["text", "bigint", "numeric", "timestamp", "boolean"]

[[predefined.target]]
name = "src_cd"
datatype = "text"
mandatory = "not null"

[keys]
hash_ignore = ["src_cd", "deleted_flg"]
distribution_ignore = []

[type_compatibility]
pairs = [
    { source = "string", target = "text" },
    { source = "string", target = "timestamp" },
    { source = "bigint", target = "bigint" },
    { source = "decimal", target = "numeric" },
]

[source_systems.DAPP]
delete_marker = "upper(changetype) = 'DELETE'"
technical_fields = [
    { name = "hdp_processed_dttm", datatype = "timestamp" },
    { name = "changetype", datatype = "string", capture_mode = "increment" },
]

[source_systems.DRP]
delete_marker = "upper(op_type) = 'DELETE'"
technical_fields = [
    { name = "processed_dt", datatype = "timestamp" },
    { name = "op_type", datatype = "string", capture_mode = "increment" },
]

[workflow]
filters = ['^wf_']
"#;

const CATALOG_HEADER: &str = "Tgt_table,Src_table,Flow_name,Source_name,Algorithm_UID\n";
const MAPPING_HEADER: &str = "Tgt_table,Tgt_attribute,Tgt_attr_datatype,Tgt_attr_mandatory,Tgt_PK,Src_table,Src_attr,Src_attr_datatype,Expression,Attr:Conversion_type,Attr:BK_Schema,Attr:BK_Object,Attr:nulldefault,Algorithm_UID\n";

const ORDERS_CATALOG: &str = "sales.orders,dapp.orders,wf_dapp_orders,DAPP,alg_01\n";
const ORDERS_ROWS: &str = "\
sales.orders,order_id,bigint,not null,pk,dapp.orders,order_id,bigint,,,,,,alg_01
sales.orders,src_cd,text,not null,,dapp.orders,,,='DAPP',,,,,alg_01
sales.orders,amount,numeric,null,,dapp.orders,amount,decimal,,,,,,alg_01
sales.orders,created_at,timestamp,null,,dapp.orders,created_at,string,,,,,,alg_01
sales.orders,customer_rk,bigint,null,\"rk, bk\",dapp.orders,customer_id,string,,hub,dapp_customer,hub.customer_reference_table_long_name,-1,alg_01
";

const ITEMS_CATALOG: &str = "sales.items,drp.items,wf_drp_items,DRP,alg_02\n";
const ITEMS_ROWS: &str = "\
sales.items,item_id,bigint,not null,pk,drp.items,item_id,bigint,,,,,,alg_02
sales.items,src_cd,text,not null,,drp.items,,,='DRP',,,,,alg_02
";

fn config() -> Config {
    parse_config(CONFIG).expect("test config")
}

fn workbook(catalog: &str, rows: &str) -> CsvWorkbook {
    CsvWorkbook::new()
        .with_sheet("catalog", format!("{CATALOG_HEADER}{catalog}"))
        .with_sheet("mapping", format!("{MAPPING_HEADER}{rows}"))
}

fn build(catalog: &str, rows: &str, capture_mode: DataCaptureMode) -> RunReport {
    build_with(&config(), catalog, rows, capture_mode)
}

fn build_with(
    config: &Config,
    catalog: &str,
    rows: &str,
    capture_mode: DataCaptureMode,
) -> RunReport {
    let options = RunOptions { capture_mode };
    run_from_reader(
        &workbook(catalog, rows),
        config,
        options,
        &mut SequentialNameGenerator::new(),
    )
    .expect("workbook loads")
}

fn built<'a>(report: &'a RunReport, table: &str) -> &'a TableMapping {
    let entry = report.table(table).expect("table reported");
    match &entry.outcome {
        TableOutcome::Built(mapping) => mapping.as_ref(),
        other => panic!("{table} was not built: {other:?}"),
    }
}

fn failure<'a>(report: &'a RunReport, table: &str) -> &'a MappingError {
    report
        .table(table)
        .and_then(|entry| entry.error())
        .unwrap_or_else(|| panic!("{table} did not fail"))
}

fn names<T>(items: impl IntoIterator<Item = T>, name: impl Fn(T) -> String) -> Vec<String> {
    items.into_iter().map(name).collect()
}

// ============================================================================
// Complete table
// ============================================================================

#[test]
fn builds_all_three_contexts() {
    let report = build(ORDERS_CATALOG, ORDERS_ROWS, DataCaptureMode::Snapshot);
    assert!(!report.has_failures());
    assert!(!report.has_warnings(), "{:?}", report.diagnostics);
    let mapping = built(&report, "sales.orders");

    let target = &mapping.target;
    assert_eq!(target.table.qualified(), "sales.orders");
    assert_eq!(
        names(&target.fields, |f| f.name.clone()),
        vec!["order_id", "src_cd", "amount", "created_at", "customer_rk"]
    );
    assert_eq!(
        names(&target.hash_fields, Clone::clone),
        vec!["amount", "created_at"]
    );
    assert_eq!(
        names(&target.distribution_key_fields, Clone::clone),
        vec!["order_id"]
    );
    assert_eq!(
        names(&target.hub_tables, Clone::clone),
        vec!["hub.customer_reference_table_long_name"]
    );
    assert_eq!(target.source_code, "dapp");
    assert_eq!(target.actual_dttm_field, "dapp_actual_dttm");

    let source = &mapping.source;
    assert_eq!(source.table.qualified(), "dapp.orders");
    assert_eq!(source.source_system, "DAPP");
    assert_eq!(
        names(&source.fields, |f| f.name.clone()),
        vec![
            "order_id",
            "amount",
            "created_at",
            "customer_id",
            "hdp_processed_dttm"
        ]
    );

    let context = &mapping.mapping;
    assert_eq!(context.workflow_name, "dapp_orders");
    assert_eq!(context.workflow_file(), "wf_dapp_orders");
    assert_eq!(context.control_flow_file(), "cf_dapp_orders");
    assert_eq!(context.algorithm_id, "alg_01");
    assert_eq!(context.source_code, "DAPP");
    assert_eq!(
        names(&context.field_map, |e| e.target_field.clone()),
        vec!["order_id", "src_cd", "amount", "created_at"]
    );
    let src_cd = context.entry("src_cd").expect("src_cd entry");
    assert_eq!(src_cd.kind, FieldMapKind::SqlExpression);
    assert_eq!(src_cd.value, "'DAPP'");
}

#[test]
fn string_to_timestamp_is_cast() {
    let report = build(ORDERS_CATALOG, ORDERS_ROWS, DataCaptureMode::Snapshot);
    let entry = built(&report, "sales.orders")
        .mapping
        .entry("created_at")
        .cloned()
        .expect("created_at entry");
    assert_eq!(entry.kind, FieldMapKind::SqlExpression);
    assert_eq!(entry.value, "created_at::timestamp");
    assert_eq!(entry.target_datatype, "timestamp");
}

#[test]
fn long_hub_table_gets_synthesized_short_name() {
    let report = build(ORDERS_CATALOG, ORDERS_ROWS, DataCaptureMode::Snapshot);
    let hub = &built(&report, "sales.orders").target.hub_fields[0];
    assert_eq!(hub.source_field_name, "customer_rk");
    assert_eq!(hub.hub_foreign_key_field, "customer_id");
    assert_eq!(hub.hub_schema, "hub");
    assert_eq!(hub.hub_table_name, "customer_reference_table_long_name");
    assert_eq!(hub.hub_short_name, "hub_customer_ref_aaaaa");
    assert_eq!(hub.business_key_schema, "dapp_customer");
    assert_eq!(hub.source_attribute.as_deref(), Some("customer_id"));
    assert_eq!(hub.null_default_policy.as_deref(), Some("-1"));
    assert!(hub.is_business_key);
}

#[test]
fn random_short_names_keep_the_platform_shape() {
    let workbook = MappingWorkbook::load(
        &workbook(ORDERS_CATALOG, ORDERS_ROWS),
        &config().sheets,
    )
    .expect("load");
    let report = run(
        &workbook,
        &config(),
        RunOptions::default(),
        &mut RandomNameGenerator,
    );
    let short = &built(&report, "sales.orders").target.hub_fields[0].hub_short_name;
    let re = regex::Regex::new(r"^hub_[a-z0-9_]{1,12}_[a-z]{5}$").unwrap();
    assert!(re.is_match(short), "{short}");
}

#[test]
fn short_hub_table_name_is_kept() {
    let rows = ORDERS_ROWS.replace("hub.customer_reference_table_long_name", "hub.customer");
    let report = build(ORDERS_CATALOG, &rows, DataCaptureMode::Snapshot);
    let hub = &built(&report, "sales.orders").target.hub_fields[0];
    assert_eq!(hub.hub_short_name, "customer");
}

#[test]
fn same_input_builds_same_contexts() {
    let first = build(ORDERS_CATALOG, ORDERS_ROWS, DataCaptureMode::Increment);
    let second = build(ORDERS_CATALOG, ORDERS_ROWS, DataCaptureMode::Increment);
    assert_eq!(
        built(&first, "sales.orders"),
        built(&second, "sales.orders")
    );
}

// ============================================================================
// Capture mode
// ============================================================================

#[test]
fn increment_synthesizes_deleted_flag_per_source_system() {
    let catalog = format!("{ORDERS_CATALOG}{ITEMS_CATALOG}");
    let rows = format!("{ORDERS_ROWS}{ITEMS_ROWS}");
    let report = build(&catalog, &rows, DataCaptureMode::Increment);

    let orders = built(&report, "sales.orders");
    let deleted = orders.mapping.entry("deleted_flg").expect("deleted flag");
    assert_eq!(deleted.kind, FieldMapKind::SqlExpression);
    assert_eq!(deleted.value, "upper(changetype) = 'DELETE'");
    assert_eq!(deleted.target_datatype, "boolean");
    assert!(
        orders
            .source
            .fields
            .iter()
            .any(|field| field.name == "changetype")
    );

    let items = built(&report, "sales.items");
    let deleted = items.mapping.entry("deleted_flg").expect("deleted flag");
    assert_eq!(deleted.value, "upper(op_type) = 'DELETE'");
    assert_eq!(items.source.data_capture_mode, DataCaptureMode::Increment);
}

#[test]
fn snapshot_has_no_deleted_flag() {
    let report = build(ORDERS_CATALOG, ORDERS_ROWS, DataCaptureMode::Snapshot);
    let orders = built(&report, "sales.orders");
    assert!(orders.mapping.entry("deleted_flg").is_none());
    assert!(
        !orders
            .source
            .fields
            .iter()
            .any(|field| field.name == "changetype")
    );
}

// ============================================================================
// Table-scoped failures
// ============================================================================

#[test]
fn row_without_source_or_expression_fails_only_its_table() {
    let catalog = format!("{ORDERS_CATALOG}{ITEMS_CATALOG}");
    let rows = format!(
        "{ORDERS_ROWS}sales.orders,comment,text,null,,dapp.orders,,,,,,,,alg_01\n{ITEMS_ROWS}"
    );
    let report = build(&catalog, &rows, DataCaptureMode::Snapshot);

    let err = failure(&report, "sales.orders");
    assert_eq!(err.kind(), "mapping-description");
    assert_eq!(err.messages(), vec!["row 7 (comment): incorrect field description"]);
    built(&report, "sales.items");
    assert!(report.has_failures());
}

#[test]
fn nullable_primary_key_fails_field_validation() {
    let rows = ORDERS_ROWS.replace(
        "sales.orders,order_id,bigint,not null,pk",
        "sales.orders,order_id,bigint,null,pk",
    );
    let report = build(ORDERS_CATALOG, &rows, DataCaptureMode::Snapshot);
    let err = failure(&report, "sales.orders");
    assert!(matches!(err, MappingError::FieldValidation { .. }));
    assert!(err.messages()[0].contains("row 2 (order_id)"));
}

#[test]
fn field_violations_are_collected_together() {
    let rows = ORDERS_ROWS
        .replace("amount,numeric,null", "amount,money,null")
        .replace("src_cd,text,not null", "src_cd,text,null");
    let report = build(ORDERS_CATALOG, &rows, DataCaptureMode::Snapshot);
    let MappingError::FieldValidation { violations, .. } = failure(&report, "sales.orders") else {
        panic!("expected field validation");
    };
    assert_eq!(violations.len(), 2, "{violations:?}");
    assert!(violations[0].contains("`money` is not allowed"));
    assert!(violations[1].contains("predefined target field `src_cd`"));
}

#[test]
fn target_field_outside_naming_pattern_fails() {
    let rows = ORDERS_ROWS.replace(
        "sales.orders,amount,numeric,null",
        "sales.orders,amount-eur,numeric,null",
    );
    let report = build(ORDERS_CATALOG, &rows, DataCaptureMode::Snapshot);
    let err = failure(&report, "sales.orders");
    assert_eq!(err.kind(), "field-validation");
    assert_eq!(
        err.messages(),
        vec!["row 4 (amount-eur): target field name does not match `^[a-z][a-z0-9_]*$`"]
    );
}

#[test]
fn source_field_outside_naming_pattern_fails() {
    let rows = ORDERS_ROWS.replace("dapp.orders,amount,decimal", "dapp.orders,amount-src,decimal");
    let report = build(ORDERS_CATALOG, &rows, DataCaptureMode::Snapshot);
    let err = failure(&report, "sales.orders");
    assert_eq!(err.kind(), "field-validation");
    assert_eq!(
        err.messages(),
        vec!["row 4 (amount): source field name `amount-src` does not match `^[a-z][a-z0-9_]*$`"]
    );
}

#[test]
fn predefined_source_fields_must_be_present_with_their_datatype() {
    let mut config = config();
    config.predefined.source = vec![
        PredefinedSourceField {
            name: "load_id".to_string(),
            datatype: "bigint".to_string(),
        },
        PredefinedSourceField {
            name: "amount".to_string(),
            datatype: "bigint".to_string(),
        },
    ];
    let report = build_with(&config, ORDERS_CATALOG, ORDERS_ROWS, DataCaptureMode::Snapshot);
    let err = failure(&report, "sales.orders");
    assert_eq!(err.kind(), "field-validation");
    assert_eq!(
        err.messages(),
        vec![
            "required source field `load_id` is missing",
            "required source field `amount` must be `bigint`, found `decimal`",
        ]
    );
}

#[test]
fn profile_required_fields_apply_to_their_source_system_only() {
    let mut config = config();
    config
        .source_systems
        .get_mut("DRP")
        .expect("DRP profile")
        .required_fields
        .push(PredefinedSourceField {
            name: "item_version".to_string(),
            datatype: "bigint".to_string(),
        });
    let catalog = format!("{ORDERS_CATALOG}{ITEMS_CATALOG}");
    let rows = format!("{ORDERS_ROWS}{ITEMS_ROWS}");
    let report = build_with(&config, &catalog, &rows, DataCaptureMode::Snapshot);

    built(&report, "sales.orders");
    let err = failure(&report, "sales.items");
    assert_eq!(err.kind(), "field-validation");
    assert_eq!(
        err.messages(),
        vec!["required source field `item_version` is missing"]
    );

    let items_rows = ITEMS_ROWS.replace("drp.items,item_id,bigint", "drp.items,item_version,string");
    let report = build_with(&config, ITEMS_CATALOG, &items_rows, DataCaptureMode::Snapshot);
    assert_eq!(
        failure(&report, "sales.items").messages(),
        vec!["required source field `item_version` must be `bigint`, found `string`"]
    );
}

#[test]
fn predefined_target_field_declared_twice_fails() {
    let rows = format!(
        "{ORDERS_ROWS}sales.orders,src_cd,text,not null,,dapp.orders,,,='DAPP',,,,,alg_01\n"
    );
    let report = build(ORDERS_CATALOG, &rows, DataCaptureMode::Snapshot);
    let err = failure(&report, "sales.orders");
    assert_eq!(err.kind(), "field-validation");
    assert_eq!(
        err.messages(),
        vec!["predefined target field `src_cd` is declared 2 times"]
    );
}

#[test]
fn hub_reference_breaking_the_hub_pattern_is_structural() {
    for reference in ["Hub.cust-1", "hub.9abc"] {
        let rows = ORDERS_ROWS.replace("hub.customer_reference_table_long_name", reference);
        let report = build(ORDERS_CATALOG, &rows, DataCaptureMode::Snapshot);
        let err = failure(&report, "sales.orders");
        assert_eq!(err.kind(), "structural-data", "{reference}");
        let expected = format!(
            "row 6 (customer_rk): hub reference `{}` does not match `^[a-z][a-z0-9_]*\\.[a-z][a-z0-9_]*$`",
            reference.to_lowercase()
        );
        assert_eq!(err.messages(), vec![expected]);
    }
}

#[test]
fn hub_reference_without_schema_is_structural() {
    let rows = ORDERS_ROWS.replace("hub.customer_reference_table_long_name", "customer");
    let report = build(ORDERS_CATALOG, &rows, DataCaptureMode::Snapshot);
    let err = failure(&report, "sales.orders");
    assert!(matches!(err, MappingError::StructuralData { .. }));
}

#[test]
fn hub_without_business_key_role_is_structural() {
    let rows = ORDERS_ROWS.replace("\"rk, bk\"", "rk");
    let report = build(ORDERS_CATALOG, &rows, DataCaptureMode::Snapshot);
    let err = failure(&report, "sales.orders");
    assert!(matches!(err, MappingError::StructuralData { .. }));
}

#[test]
fn target_table_without_schema_is_structural() {
    let catalog = ORDERS_CATALOG.replace("sales.orders", "orders");
    let rows = ORDERS_ROWS.replace("sales.orders", "orders");
    let report = build(&catalog, &rows, DataCaptureMode::Snapshot);
    assert!(matches!(
        failure(&report, "orders"),
        MappingError::StructuralData { .. }
    ));
}

#[test]
fn unknown_source_system_is_a_description_error() {
    let catalog = ORDERS_CATALOG.replace("DAPP", "ODS");
    let report = build(&catalog, ORDERS_ROWS, DataCaptureMode::Snapshot);
    let err = failure(&report, "sales.orders");
    assert_eq!(
        err.messages(),
        vec!["source system `ODS` has no configured profile"]
    );
}

#[test]
fn extra_field_colliding_with_sheet_field_fails() {
    let mut config = config();
    config.extra_fields.push(mapgen_config::ExtraField {
        name: "amount".to_string(),
        kind: FieldMapKind::SqlExpression,
        value: "0".to_string(),
        datatype: "numeric".to_string(),
        capture_mode: None,
    });
    let workbook = MappingWorkbook::load(&workbook(ORDERS_CATALOG, ORDERS_ROWS), &config.sheets)
        .expect("load");
    let report = run(
        &workbook,
        &config,
        RunOptions::default(),
        &mut SequentialNameGenerator::new(),
    );
    let err = failure(&report, "sales.orders");
    assert!(err.messages()[0].contains("injected field `amount`"));
}

// ============================================================================
// Run-level behaviour
// ============================================================================

#[test]
fn flows_outside_the_workflow_filters_are_skipped() {
    let catalog = ORDERS_CATALOG.replace("wf_dapp_orders", "manual_dapp_orders");
    let report = build(&catalog, ORDERS_ROWS, DataCaptureMode::Snapshot);
    assert_eq!(report.skipped().count(), 1);
    assert_eq!(report.built().count(), 0);
    assert!(!report.has_failures());
}

#[test]
fn expression_without_formula_prefix_warns_but_builds() {
    let rows = ORDERS_ROWS.replace("='DAPP'", "'DAPP'");
    let report = build(ORDERS_CATALOG, &rows, DataCaptureMode::Snapshot);
    built(&report, "sales.orders");
    assert!(report.has_warnings());
    assert_eq!(report.diagnostics.count(WarningKind::ExpressionFormat), 1);
}

#[test]
fn incompatible_types_warn_but_build() {
    let rows = ORDERS_ROWS.replace("amount,decimal", "amount,string");
    let report = build(ORDERS_CATALOG, &rows, DataCaptureMode::Snapshot);
    built(&report, "sales.orders");
    assert_eq!(report.diagnostics.count(WarningKind::TypeCompatibility), 1);
    assert_eq!(report.diagnostics.for_table("sales.orders").count(), 1);
}

#[test]
fn duplicate_catalog_tables_abort_the_run() {
    let catalog = format!("{ORDERS_CATALOG}{ORDERS_CATALOG}");
    let err = run_from_reader(
        &workbook(&catalog, ORDERS_ROWS),
        &config(),
        RunOptions::default(),
        &mut SequentialNameGenerator::new(),
    )
    .unwrap_err();
    match err {
        IngestError::Mapping(MappingError::DuplicateTable { tables }) => {
            assert_eq!(tables, vec!["sales.orders".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
}
