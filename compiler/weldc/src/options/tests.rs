use pretty_assertions::assert_eq;
use weld_filter::DeniedDependencyPolicy;

use super::*;

fn args(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_owned).collect()
}

fn generate(line: &str) -> Cli {
    match parse_args(&args(line)).unwrap() {
        Command::Generate(cli) => cli,
        other => panic!("expected a generate command, got {other:?}"),
    }
}

#[test]
fn help_and_version() {
    assert_eq!(parse_args(&[]).unwrap(), Command::Help);
    assert_eq!(parse_args(&args("help")).unwrap(), Command::Help);
    assert_eq!(parse_args(&args("--help")).unwrap(), Command::Help);
    assert_eq!(parse_args(&args("version")).unwrap(), Command::Version);
}

#[test]
fn defaults() {
    let cli = generate("api.decls.json");
    assert_eq!(cli.inputs, vec![PathBuf::from("api.decls.json")]);
    assert_eq!(cli.output, None);
    assert_eq!(cli.options, BindgenOptions::default());
    assert_eq!(cli.options.naming(), NamingOptions::default());
    assert_eq!(cli.options.codegen(), CodegenOptions::default());
    assert_eq!(cli.options.triple(), DEFAULT_TARGET);
}

#[test]
fn value_flags_take_both_spellings() {
    let cli =
        generate("--allow-type point --allow-type=rect.* -o out.rs a.decls.json b.decls.json");
    assert_eq!(cli.options.filter.allow_types, vec!["point", "rect.*"]);
    assert_eq!(cli.output, Some(PathBuf::from("out.rs")));
    assert_eq!(cli.inputs.len(), 2);
}

#[test]
fn every_flag() {
    let cli = generate(
        "--allow-item a --allow-function f --deny d --opaque-type o \
         --denied-dependency opaque-field --include-system-headers \
         --keep-namespaces --enum-style consts --instantiate all \
         --target aarch64-apple-darwin --no-layout-tests --no-derive-debug in.json",
    );
    let options = &cli.options;
    assert_eq!(options.filter.allow_items, vec!["a"]);
    assert_eq!(options.filter.allow_functions, vec!["f"]);
    assert_eq!(options.filter.deny, vec!["d"]);
    assert_eq!(options.filter.opaque, vec!["o"]);
    assert_eq!(
        options.filter.denied_dependency,
        DeniedDependencyPolicy::OpaqueField
    );
    assert!(options.filter.include_system_headers);
    assert_eq!(
        options.naming(),
        NamingOptions {
            flatten_namespaces: false,
            enum_style: EnumStyle::Consts,
        }
    );
    assert_eq!(options.instantiate, InstantiationSelection::All);
    assert_eq!(options.triple(), "aarch64-apple-darwin");
    assert_eq!(
        options.codegen(),
        CodegenOptions {
            layout_tests: false,
            derive_debug: false,
        }
    );
}

#[test]
fn frontend_flags_after_separator() {
    let cli = generate(
        "in.json -- -Iinclude -I vendor -DDEBUG -DLEVEL=3 -std=c11 \
         --target=i686-unknown-linux-gnu",
    );
    let frontend = &cli.options.frontend;
    assert_eq!(
        frontend.include_paths,
        vec![PathBuf::from("include"), PathBuf::from("vendor")]
    );
    assert_eq!(
        frontend.defines,
        vec![
            ("DEBUG".to_owned(), None),
            ("LEVEL".to_owned(), Some("3".to_owned())),
        ]
    );
    assert_eq!(frontend.std.as_deref(), Some("c11"));
    assert_eq!(cli.options.triple(), "i686-unknown-linux-gnu");
}

#[test]
fn instantiation_patterns_accumulate() {
    let cli = generate("--instantiate-matching Box<.*> --instantiate-matching Vec<int> in.json");
    assert_eq!(
        cli.options.instantiate,
        InstantiationSelection::Matching(vec!["Box<.*>".to_owned(), "Vec<int>".to_owned()])
    );
}

#[test]
fn usage_errors() {
    assert_eq!(
        parse_args(&args("--frobnicate in.json")).unwrap_err(),
        UsageError::UnknownFlag("--frobnicate".to_owned())
    );
    assert_eq!(
        parse_args(&args("in.json --allow-type")).unwrap_err(),
        UsageError::MissingValue("--allow-type".to_owned())
    );
    assert_eq!(
        parse_args(&args("--no-layout-tests")).unwrap_err(),
        UsageError::NoInputs
    );
    assert!(matches!(
        parse_args(&args("--enum-style fancy in.json")).unwrap_err(),
        UsageError::InvalidValue { flag, .. } if flag == "--enum-style"
    ));
    assert!(matches!(
        parse_args(&args("--instantiate some in.json")).unwrap_err(),
        UsageError::InvalidValue { flag, .. } if flag == "--instantiate"
    ));
    assert_eq!(
        parse_args(&args("in.json -- -Wall")).unwrap_err(),
        UsageError::UnknownFlag("-Wall".to_owned())
    );
}

#[test]
fn directive_flags_reject_inputs_and_output() {
    assert_eq!(
        parse_flags(&args("--deny x extra.json")).unwrap_err(),
        UsageError::UnexpectedArgument("extra.json".to_owned())
    );
    assert_eq!(
        parse_flags(&args("-o out.rs")).unwrap_err(),
        UsageError::UnexpectedArgument("-o".to_owned())
    );
    let options = parse_flags(&args("--deny x -- -DX")).unwrap();
    assert_eq!(options.filter.deny, vec!["x"]);
    assert_eq!(options.frontend.defines, vec![("X".to_owned(), None)]);
}

#[test]
fn merge_layers_settings_and_appends_lists() {
    let mut base = generate(
        "--allow-type a --keep-namespaces --no-layout-tests \
         --target i686-unknown-linux-gnu in.json",
    )
    .options;
    let directive =
        parse_flags(&args("--allow-type b --flatten-namespaces --enum-style consts")).unwrap();
    base.merge(&directive);

    assert_eq!(base.filter.allow_types, vec!["a", "b"]);
    assert!(base.naming().flatten_namespaces);
    assert_eq!(base.naming().enum_style, EnumStyle::Consts);
    // Not mentioned by the directive, so the command line wins.
    assert!(!base.codegen().layout_tests);
    assert_eq!(base.triple(), "i686-unknown-linux-gnu");
}

#[test]
fn merge_instantiation_selection() {
    let mut base = BindgenOptions {
        instantiate: InstantiationSelection::Matching(vec!["A<.*>".to_owned()]),
        ..BindgenOptions::default()
    };
    base.merge(&BindgenOptions::default());
    assert_eq!(
        base.instantiate,
        InstantiationSelection::Matching(vec!["A<.*>".to_owned()])
    );

    base.merge(&BindgenOptions {
        instantiate: InstantiationSelection::Matching(vec!["B<.*>".to_owned()]),
        ..BindgenOptions::default()
    });
    assert_eq!(
        base.instantiate,
        InstantiationSelection::Matching(vec!["A<.*>".to_owned(), "B<.*>".to_owned()])
    );

    base.merge(&BindgenOptions {
        instantiate: InstantiationSelection::All,
        ..BindgenOptions::default()
    });
    assert_eq!(base.instantiate, InstantiationSelection::All);
}

#[test]
fn validation_catches_bad_patterns_and_targets() {
    let bad_pattern = generate("--deny ( in.json").options;
    assert!(matches!(
        bad_pattern.validate().unwrap_err(),
        UsageError::InvalidValue { flag, .. } if flag == "--deny"
    ));

    let bad_target = generate("--target sparc-sun-solaris in.json").options;
    assert!(matches!(
        bad_target.validate().unwrap_err(),
        UsageError::InvalidValue { flag, .. } if flag == "--target"
    ));

    let bad_instantiation = generate("--instantiate-matching [ in.json").options;
    assert!(matches!(
        bad_instantiation.validate().unwrap_err(),
        UsageError::InvalidValue { flag, .. } if flag == "--instantiate-matching"
    ));

    generate("--allow-type p.* in.json").options.validate().unwrap();
}
