//! Node tree behaviour through the public API.

use cfgtree::config::{
    AccessFlags, ConfigDocument, ConfigTree, DotAccess, Resolved, Resource, ValidationFlags,
};
use cfgtree::error::ConfigError;
use cfgtree::parse_ini;
use cfgtree::testing::assert_node;
use std::sync::Arc;

fn fixture(name: &str) -> String {
    let path = format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"));
    std::fs::read_to_string(&path).expect("fixture to exist")
}

fn document(name: &str) -> ConfigDocument {
    let resource = Resource::file(format!("tests/fixtures/{name}"));
    ConfigDocument::from_ini_str(resource, &fixture(name)).expect("fixture to parse")
}

#[test]
fn test_document_root_is_named_after_file() {
    let doc = document("app.ini");
    assert_node(doc.root())
        .name("app")
        .property("name", "demo")
        .property("server.port", "8080")
        .property("app.server.port", "8080")
        .child_names(&["server", "client"]);
}

#[test]
fn test_required_and_optional_lookups() {
    let doc = document("app.ini");
    let root = doc.root();
    assert_eq!(root.find_property("server.missing"), None);
    assert_eq!(
        root.property("server.missing"),
        Err(ConfigError::NotFound {
            path: "server.missing".into(),
            context: "app".into(),
        })
    );
    assert!(root.child("client.retries").is_err());
    assert_eq!(root.property_as::<u32>("client.retries"), Ok(3));
}

#[test]
fn test_merge_overlay() {
    let mut doc = document("app.ini");
    let overlay = parse_ini(&fixture("overlay.ini")).unwrap();
    doc.merge(&overlay).unwrap();

    assert_node(doc.root())
        .name("app")
        .child_names(&["server", "client", "logging"])
        .child("server", |server| {
            server
                .property("host", "localhost")
                .property("port", "9090")
                .property("tls", "true");
        })
        .property("logging.level", "debug");
}

#[test]
fn test_merged_leaves_original_untouched() {
    let doc = document("app.ini");
    let overlay = parse_ini("[client]\nretries = 5\n").unwrap();
    let merged = doc.root().merged(&overlay).unwrap();
    assert_eq!(merged.root().property("client.retries"), Ok("5"));
    assert_eq!(doc.root().property("client.retries"), Ok("3"));
}

#[test]
fn test_merge_rename_collision() {
    let mut tree = parse_ini("[a]\n[b]\n").unwrap();
    let renamed = ConfigTree::new("a");
    let err = tree
        .root_mut()
        .child_mut("b")
        .unwrap()
        .merge(&renamed)
        .unwrap_err();
    assert!(matches!(err, ConfigError::DuplicateName { .. }));
}

#[test]
fn test_remove_child_keeps_sibling_order() {
    let mut tree = parse_ini("[a]\nk = 1\n[b]\nk = 2\n[c]\nk = 3\n").unwrap();
    tree.root_mut().set_property("b.deep.x", "1").unwrap();

    let removed = tree.root_mut().remove_direct_child("b").unwrap();
    assert_node(removed.root()).name("b").property("deep.x", "1");
    assert_node(tree.root())
        .child_names(&["a", "c"])
        .no_child("b")
        .no_child("b.deep")
        .no_property("b.deep.x");
}

#[test]
fn test_add_child_checks_dotted_names() {
    let mut tree = parse_ini("[a]\n").unwrap();
    tree.root_mut()
        .child_mut("a")
        .unwrap()
        .create_child("b");

    // "a.b" as one name collides with the existing path a.b
    let err = tree.root_mut().add_child(ConfigTree::new("a.b")).unwrap_err();
    assert!(matches!(err, ConfigError::DuplicateName { .. }));

    // a direct insertion only looks at direct children
    tree.root_mut()
        .add_direct_child(ConfigTree::new("a.b"))
        .unwrap();
    assert!(tree.root().has_direct_child("a.b"));
}

#[test]
fn test_set_child_creates_path() {
    let mut tree = ConfigTree::new("");
    let mut sub = ConfigTree::with_value("ignored", "v");
    sub.root_mut().set_direct_property("k", "1");
    tree.root_mut().set_child("x.y.z", sub).unwrap();

    assert_node(tree.root())
        .child("x.y.z", |z| {
            z.name("z").value("v").property("k", "1");
        });
    assert_eq!(tree.root().child("x.y.z").unwrap().path(), "x.y.z");
    assert_eq!(
        tree.root_mut().set_child("x..z", ConfigTree::new("")).unwrap_err(),
        ConfigError::InvalidPath("x..z".into())
    );
}

#[test]
fn test_dot_access_walk() {
    let tree = parse_ini("[db]\nhost = h\n").unwrap();
    let resolved = DotAccess::new("db.host", AccessFlags::NEED_PROPERTY)
        .walk(&tree, tree.root_id())
        .unwrap();
    match resolved {
        Resolved::Property { node, key } => {
            assert_eq!(key, "host");
            assert_eq!(tree.node(node).map(|n| n.name()), Some("db"));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_listings() {
    let doc = document("app.ini");
    let root = doc.root();
    assert_eq!(root.property_names(), vec!["name"]);
    assert_eq!(root.child_paths(), vec!["app.server", "app.client"]);
    assert_eq!(
        root.property_paths(),
        vec![
            "app.name",
            "app.server.host",
            "app.server.port",
            "app.client.retries",
        ]
    );
}

#[test]
fn test_schema_validation() {
    let mut doc = document("app.ini");
    let schema = Arc::new(parse_ini(&fixture("schema.ini")).unwrap());
    doc.root_mut().set_schema(Some(schema.clone()));
    assert_eq!(doc.root().validate(ValidationFlags::NONE), Ok(()));

    doc.root_mut().set_property("server.port", "eighty").unwrap();
    doc.root_mut().set_property("extra.x", "1").unwrap();
    let err = doc.root().validate(ValidationFlags::NONE).unwrap_err();
    assert_eq!(
        err.to_string(),
        "validation failed: app.server.port: expected integer, found 'eighty'; \
         app.extra: unexpected node"
    );
    assert!(doc
        .root()
        .validate(ValidationFlags::ALLOW_UNKNOWN | ValidationFlags::FIRST_ONLY)
        .is_err());
    assert!(Arc::ptr_eq(doc.root().schema().unwrap(), &schema));
}

#[test]
fn test_json_rendering() {
    let tree = parse_ini("a = 1\n[s]\nb = 2\n").unwrap();
    insta::assert_snapshot!(serde_json::to_string_pretty(&tree).unwrap(), @r#"
    {
      "name": "",
      "value": "",
      "properties": {
        "a": "1"
      },
      "children": [
        {
          "name": "s",
          "value": "",
          "properties": {
            "b": "2"
          },
          "children": []
        }
      ]
    }
    "#);
}
