//! Library-level compilation of the shared fixtures.

use typeforge_compiler::{
    compile, compile_file, CompileError, CompileOptions, CompiledModel, DefaultLoader,
    DocumentSet, ExternalShape, FlattenPolicy, Nullability, ParamSource, StaticCatalog,
    StatusCode, TypeModel,
};

use crate::fixtures_dir;

fn compile_fixture(name: &str, options: &CompileOptions) -> Result<CompiledModel, CompileError> {
    compile_file(&fixtures_dir().join(name), options)
}

fn field_names(model: &CompiledModel, id: &str) -> Vec<String> {
    match model.type_of(id) {
        Some(TypeModel::Object { fields, .. }) => fields.iter().map(|f| f.name.clone()).collect(),
        other => panic!("{} is not an object: {:?}", id, other),
    }
}

#[test]
fn petstore_model() {
    let model = compile_fixture("petstore.yaml", &CompileOptions::default()).unwrap();
    let ids: Vec<&str> = model.definitions().iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["NewPet", "Pet", "Tag", "Error"]);

    assert_eq!(
        field_names(&model, "Pet"),
        vec!["name", "tag", "status", "id", "tags", "attributes"]
    );
    // x-order puts name before id.
    assert_eq!(field_names(&model, "Tag"), vec!["name", "id"]);

    match model.type_of("Pet") {
        Some(TypeModel::Object { fields, .. }) => {
            let status = fields.iter().find(|f| f.name == "status").unwrap();
            assert!(matches!(status.ty, TypeModel::Enum { .. }));
            assert_eq!(status.nullability, Nullability::Defaulted);
            let attributes = fields.iter().find(|f| f.name == "attributes").unwrap();
            assert!(matches!(attributes.ty, TypeModel::Map { .. }));
        }
        other => panic!("unexpected Pet type: {other:?}"),
    }

    let ops: Vec<&str> = model.operations().iter().map(|o| o.id.as_str()).collect();
    assert_eq!(ops, vec!["listPets", "createPet", "showPetById", "deletePet"]);

    let create = model.operation("createPet").unwrap();
    assert!(matches!(
        create.request_type(),
        Some(TypeModel::Named { definition }) if definition.as_str() == "NewPet"
    ));

    let list = model.operation("listPets").unwrap();
    assert_eq!(list.responses[&StatusCode::Code(200)].headers.len(), 1);
    assert_eq!(list.parameters[1].collection_format.as_deref(), Some("csv"));
    assert_eq!(list.consumes, vec!["application/json".to_string()]);

    let delete = model.operation("deletePet").unwrap();
    let sources: Vec<ParamSource> = delete.parameters.iter().map(|p| p.source).collect();
    assert_eq!(sources, vec![ParamSource::Path, ParamSource::Header]);
}

#[test]
fn polymorphic_model() {
    let model = compile_fixture("polymorphic.yaml", &CompileOptions::default()).unwrap();
    match model.type_of("Animal") {
        Some(TypeModel::Polymorphic {
            discriminator_field,
            variants,
            ..
        }) => {
            assert_eq!(discriminator_field, "kind");
            let keys: Vec<&str> = variants.keys().map(String::as_str).collect();
            assert_eq!(keys, vec!["dog", "cat"]);
        }
        other => panic!("unexpected Animal type: {other:?}"),
    }
    let dog = model.definition("Dog").unwrap();
    assert_eq!(dog.discriminator_value.as_deref(), Some("dog"));
    assert_eq!(field_names(&model, "Cat"), vec!["kind", "name", "meow"]);
}

#[test]
fn cycles_model() {
    let model = compile_fixture("cycles.yaml", &CompileOptions::default()).unwrap();
    match model.type_of("TreeNode") {
        Some(TypeModel::Object { fields, .. }) => match &fields[1].ty {
            TypeModel::Array { element, .. } => {
                assert!(matches!(**element, TypeModel::CycleRef { .. }))
            }
            other => panic!("unexpected children type: {other:?}"),
        },
        other => panic!("unexpected TreeNode type: {other:?}"),
    }
    let department = model.definition("Department").unwrap();
    assert!(department.back_refs.iter().any(|d| d.as_str() == "Employee"));
}

#[test]
fn external_documents_are_followed() {
    let options = CompileOptions::default();
    let model = compile_fixture("external/main.yaml", &options).unwrap();
    assert!(model.definition("Customer").is_some());
    assert!(model.definition("Address").is_some());

    let path = fixtures_dir().join("external/main.yaml");
    let catalog = StaticCatalog::new().with("time.Time", ExternalShape::Scalar);
    let documents = DocumentSet::load(&path.to_string_lossy(), &DefaultLoader::default()).unwrap();
    assert_eq!(documents.len(), 2);
    let model = compile(&documents, &options, &catalog).unwrap();
    match model.type_of("Order") {
        Some(TypeModel::Object { fields, .. }) => assert!(matches!(
            fields[1].ty,
            TypeModel::External { shape: ExternalShape::Scalar, .. }
        )),
        other => panic!("unexpected Order type: {other:?}"),
    }

    let err = compile(&documents, &options, &StaticCatalog::new()).unwrap_err();
    assert_eq!(err.code(), "E2006");
}

#[test]
fn openapi3_form_upload() {
    let model = compile_fixture("openapi3.yaml", &CompileOptions::default()).unwrap();
    let upload = model.operation("uploadAvatar").unwrap();
    let form: Vec<&str> = upload
        .parameters_in(ParamSource::Form)
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(form, vec!["file", "caption"]);
    assert!(upload.parameters.iter().any(|p| p.cookie));
    assert!(upload.responses.contains_key(&StatusCode::Range(4)));
}

#[test]
fn full_flattening_is_deterministic() {
    let options = CompileOptions::default().with_flatten(FlattenPolicy::Full);
    let first = compile_fixture("petstore.yaml", &options.clone().with_parallel(true)).unwrap();
    let second = compile_fixture("petstore.yaml", &options.with_parallel(false)).unwrap();
    assert_eq!(
        serde_json::to_value(&first).unwrap(),
        serde_json::to_value(&second).unwrap()
    );
    assert!(first.definition("NewPetStatus").is_some());
}

#[test]
fn invalid_fixtures_report_typed_errors() {
    let options = CompileOptions::default();
    let cases = [
        ("invalid-unbound-path.yaml", "E2004"),
        ("invalid-conflict.yaml", "E2002"),
        ("invalid-parse-error.yaml", "E1002"),
        ("missing.yaml", "E1005"),
    ];
    for (file, code) in cases {
        let err = compile_fixture(file, &options).unwrap_err();
        assert_eq!(err.code(), code, "{}: {}", file, err);
    }
}
