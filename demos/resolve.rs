//! Example: resolve a small slice of a Python package index using resolvo.
//!
//! Models a handful of real projects with `Requires-Dist` entries, an extra
//! (`requests[socks]`), an environment marker, a `Requires-Python` bound and
//! a pre-release.
//!
//! Runs the resolver twice, once plain and once with the extra requested, to
//! show how extras widen the dependency graph.

use std::str::FromStr;

use pep508_resolvo::{
    ExtraName, Factory, FactoryOptions, InMemoryRepository, InstallRequest, PackageMetadata,
    PackageName, Pep508RequestConstructor, Version, VersionSpecifiers, resolve,
};

/// Shorthand to build a release from a name, a version and its dependencies.
fn pkg(name: &str, version: &str, deps: &[&str]) -> PackageMetadata {
    PackageMetadata::new(
        PackageName::from_str(name).unwrap(),
        Version::from_str(version).unwrap(),
    )
    .with_requires_dist(deps.iter().copied())
}

/// Build the index, shared between both resolver runs.
fn build_repo() -> InMemoryRepository {
    let mut repo = InMemoryRepository::new();

    repo.add(pkg("idna", "3.6", &[]));
    repo.add(pkg("idna", "3.7", &[]));
    repo.add(pkg("certifi", "2024.2.2", &[]));
    repo.add(pkg("charset-normalizer", "3.3.2", &[]));
    repo.add(pkg("pysocks", "1.7.1", &[]));
    repo.add(pkg("importlib-metadata", "6.7.0", &[]));

    // urllib3 2.x dropped old interpreters.
    repo.add(pkg("urllib3", "1.26.18", &[]));
    repo.add(
        pkg("urllib3", "2.2.1", &[])
            .with_requires_python(VersionSpecifiers::from_str(">=3.8").unwrap()),
    );
    repo.add(pkg("urllib3", "2.3.0rc1", &[]));

    let socks = ExtraName::from_str("socks").unwrap();
    repo.add(
        pkg(
            "requests",
            "2.31.0",
            &[
                "charset-normalizer>=2,<4",
                "idna>=2.5,<4",
                "urllib3>=1.21.1,<3",
                "certifi>=2017.4.17",
                "importlib-metadata; python_version < '3.8'",
            ],
        )
        .with_requires_python(VersionSpecifiers::from_str(">=3.7").unwrap())
        .with_extra(socks, ["PySocks>=1.5.6,!=1.5.7"]),
    );

    repo
}

fn run(title: &str, repo: &InMemoryRepository, options: FactoryOptions, roots: &[&str]) {
    println!("\n{}", "=".repeat(60));
    println!("{title}");
    println!("{}", "=".repeat(60));

    let factory = Factory::new(repo, repo, &Pep508RequestConstructor, options);
    let roots: Vec<InstallRequest> = roots
        .iter()
        .map(|s| InstallRequest::parse(s).unwrap())
        .collect();

    match resolve(&factory, &roots) {
        Ok(solution) => {
            let mut pins: Vec<String> = solution
                .iter()
                .map(|c| {
                    format!(
                        "{}=={}",
                        c.name(&factory).unwrap(),
                        c.version(&factory).unwrap()
                    )
                })
                .collect();
            pins.sort();
            println!("Resolved {} packages:", pins.len());
            for pin in pins {
                println!("  {pin}");
            }
            println!(
                "({} distinct links seen, {} metadata preparations)",
                factory.cached_candidate_count(),
                repo.prepare_count()
            );
        }
        Err(err) => println!("Resolution failed:\n{err}"),
    }
}

fn main() {
    let repo = build_repo();

    run(
        "requests on Python 3.11",
        &repo,
        FactoryOptions::from_version_info(&[3, 11, 4]),
        &["requests"],
    );

    run(
        "requests[socks] on Python 3.11",
        &repo,
        FactoryOptions::from_version_info(&[3, 11, 4]),
        &["requests[socks]"],
    );

    run(
        "requests on Python 3.7 (urllib3 2.x is skipped, the backport is needed)",
        &repo,
        FactoryOptions::from_version_info(&[3, 7, 17]),
        &["requests"],
    );

    run(
        "requests with pre-releases allowed",
        &repo,
        FactoryOptions::from_version_info(&[3, 11, 4]).with_allow_prereleases(true),
        &["requests"],
    );
}
