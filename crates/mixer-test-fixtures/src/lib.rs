//! Test fixtures for mixer composition testing
//!
//! Provides small part catalogs modelled on the classic duck example: a
//! `Duck` target composed from `Flying` and `Swimming`, each of which
//! overrides `print` and delegates to the next layer.

use mixer_core::ir::{Catalog, Expr, Field, Method, Stmt, Unit, Visibility};
use mixer_core::types::Type;
use std::fs;
use std::path::{Path, PathBuf};

/// Package every fixture unit lives in
pub const PACKAGE: &str = "jmixer";

/// Test fixture categories
pub enum FixtureType {
    /// Duck composed from Flying and Swimming
    Duck,
    /// Three counters chained through an int-returning hook
    Counters,
    /// Parts relying on members bound by the target
    Bindings,
}

/// On-disk catalog format
#[derive(Debug, Clone, Copy)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Yaml => "yaml",
        }
    }
}

/// Main test fixtures provider
pub struct TestFixtures {
    temp_dir: Option<tempfile::TempDir>,
}

impl Default for TestFixtures {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFixtures {
    pub fn new() -> Self {
        Self { temp_dir: None }
    }

    /// Write the fixture catalog into a fresh temporary directory, returning the file path
    pub fn setup(&mut self, fixture_type: FixtureType, format: Format) -> PathBuf {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(format!("catalog.{}", format.extension()));

        let catalog = match fixture_type {
            FixtureType::Duck => duck_catalog(),
            FixtureType::Counters => counter_catalog(),
            FixtureType::Bindings => binding_catalog(),
        };
        write_catalog(&path, &catalog, format);

        self.temp_dir = Some(dir);
        path
    }

    /// Directory of the most recent setup
    pub fn dir(&self) -> Option<&Path> {
        self.temp_dir.as_ref().map(|d| d.path())
    }
}

pub fn write_catalog(path: &Path, catalog: &Catalog, format: Format) {
    let content = match format {
        Format::Json => serde_json::to_string_pretty(catalog).unwrap(),
        Format::Yaml => serde_yaml::to_string(catalog).unwrap(),
    };
    fs::write(path, content).unwrap();
}

fn qualified(name: &str) -> String {
    format!("{}.{}", PACKAGE, name)
}

fn println(label: &str) -> Stmt {
    Stmt::expr(Expr::call_on(
        Expr::local("System.out"),
        "println",
        vec![Type::named("java.lang.String")],
        vec![Expr::string(label)],
    ))
}

/// A part whose `print` announces `label` and then delegates down the chain
pub fn printing_part(name: &str, label: &str, hook_visibility: Visibility) -> Unit {
    Unit::new(qualified(name))
        .abstract_unit()
        .with_method(
            Method::new("print", Type::Void)
                .with_body(vec![println(label), Stmt::expr(Expr::call("_super_print", vec![]))]),
        )
        .with_method(
            Method::new("_super_print", Type::Void)
                .with_visibility(hook_visibility)
                .into_abstract(),
        )
}

pub fn flying() -> Unit {
    printing_part("Flying", "Flying", Visibility::Public)
        .with_method(Method::new("fly", Type::Void))
        .with_field(Field::new("altitude", Type::Int))
        .with_interface(Type::named(qualified("Flyer")))
}

pub fn swimming() -> Unit {
    printing_part("Swimming", "Swimming", Visibility::Protected)
        .with_method(Method::new("swim", Type::Void))
        .with_field(Field::new("depth", Type::Int))
        .with_interface(Type::named(qualified("Swimmer")))
}

pub fn duck() -> Unit {
    Unit::new(qualified("Duck"))
        .with_mixins([qualified("Flying"), qualified("Swimming")])
        .with_interface(Type::named(qualified("Bird")))
}

pub fn duck_catalog() -> Catalog {
    let mut catalog = Catalog::new();
    catalog.add_unit(flying());
    catalog.add_unit(swimming());
    catalog.add_unit(duck());
    catalog
}

/// A part adding `step` to whatever the layers below it count
pub fn counter(name: &str, step: i32) -> Unit {
    use mixer_core::ir::Literal;

    Unit::new(qualified(name))
        .abstract_unit()
        .with_method(Method::new("count", Type::Int).with_body(vec![Stmt::ret(Some(
            Expr::Binary {
                op: "+".to_string(),
                lhs: Box::new(Expr::literal(Literal::Int(step))),
                rhs: Box::new(Expr::call("_super_count", vec![])),
            },
        ))]))
        .with_method(Method::new("_super_count", Type::Int).into_abstract())
}

pub fn counter_catalog() -> Catalog {
    let mut catalog = Catalog::new();
    catalog.add_unit(counter("Ones", 1));
    catalog.add_unit(counter("Tens", 10));
    catalog.add_unit(counter("Hundreds", 100));
    catalog.add_unit(Unit::new(qualified("Total")).with_mixins(["Ones", "Tens", "Hundreds"]));
    catalog
}

/// A part greeting through a name and a counter the target is expected to supply
pub fn greeter() -> Unit {
    let string = Type::named("java.lang.String");
    Unit::new(qualified("Greeter"))
        .abstract_unit()
        .with_field(Field::new("_this_greetings", Type::Int))
        .with_method(Method::new("_this_name", string.clone()).into_abstract())
        .with_method(Method::new("greet", string).with_body(vec![
            Stmt::expr(Expr::assign(
                Expr::field("_this_greetings"),
                Expr::Binary {
                    op: "+".to_string(),
                    lhs: Box::new(Expr::field("_this_greetings")),
                    rhs: Box::new(Expr::literal(mixer_core::ir::Literal::Int(1))),
                },
            )),
            Stmt::ret(Some(Expr::call("_this_name", vec![]))),
        ]))
}

pub fn binding_catalog() -> Catalog {
    let mut catalog = Catalog::new();
    catalog.add_unit(greeter());
    catalog.add_unit(
        Unit::new(qualified("Person"))
            .with_field(Field::new("greetings", Type::Int))
            .with_method(Method::new("name", Type::named("java.lang.String")))
            .with_mixins(["Greeter"]),
    );
    catalog
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixtures_are_valid() {
        let catalog = duck_catalog();
        assert_eq!(catalog.mixin_targets().count(), 1);
        assert!(catalog.resolve_parts(&duck().mixins).is_ok());
        assert!(counter_catalog().resolve_parts(&["Ones", "Tens"]).is_ok());
    }

    #[test]
    fn setup_writes_catalog() {
        let mut fixtures = TestFixtures::new();
        let path = fixtures.setup(FixtureType::Counters, Format::Yaml);
        assert!(path.exists());
        assert_eq!(path.extension().unwrap(), "yaml");

        let content = fs::read_to_string(&path).unwrap();
        let catalog: Catalog = serde_yaml::from_str(&content).unwrap();
        assert_eq!(catalog.units.len(), 4);
    }
}
