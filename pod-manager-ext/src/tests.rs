use super::*;

fn map(items: &[(&str, &str)]) -> BTreeMap<String, String> {
    string_map(items.iter().copied())
}

#[test]
fn pod_new_sets_name_and_namespace() {
    let pod = corev1::Pod::new("web-0", "default");
    assert_eq!(pod.metadata.name.as_deref(), Some("web-0"));
    assert_eq!(pod.metadata.namespace.as_deref(), Some("default"));
    assert!(pod.spec.is_some());
}

#[test]
fn object_meta_builders() {
    let meta = metav1::ObjectMeta::new("web-0")
        .labels([("app", "web")])
        .annotations([("owner", "team-a")]);
    assert_eq!(meta.namespace, None);
    assert_eq!(meta.labels, Some(map(&[("app", "web")])));
    assert_eq!(meta.annotations, Some(map(&[("owner", "team-a")])));
}

#[test]
fn merge_overrides_and_preserves() {
    let mut base = map(&[("foo", "merge"), ("exist", "value")]);
    let changed = merge_string_map(&mut base, &map(&[("foo", "bar"), ("new", "value")]));

    assert!(changed);
    assert_eq!(
        base,
        map(&[("foo", "bar"), ("exist", "value"), ("new", "value")])
    );
}

#[test]
fn merge_reports_no_change() {
    let mut base = map(&[("foo", "bar"), ("exist", "value")]);
    assert!(!merge_string_map(&mut base, &map(&[("foo", "bar")])));
    assert!(!merge_string_map(&mut base, &BTreeMap::new()));
}
