//! Example: show how resolution failures are reported.
//!
//! Each scenario builds a small index that cannot satisfy the requested
//! packages and prints the resolvo conflict report (or the error that stopped
//! the resolution).

use std::str::FromStr;

use pep508_resolvo::{
    Factory, FactoryOptions, InMemoryRepository, InstallRequest, Link, PackageMetadata,
    PackageName, Pep508DependencyProvider, Pep508RequestConstructor, ResolveError, Version,
    VersionSpecifiers, resolve,
};
use resolvo::{Problem, Solver, UnsolvableOrCancelled};

fn pkg(name: &str, version: &str, deps: &[&str]) -> PackageMetadata {
    PackageMetadata::new(
        PackageName::from_str(name).unwrap(),
        Version::from_str(version).unwrap(),
    )
    .with_requires_dist(deps.iter().copied())
}

fn header(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("{title}");
    println!("{}", "=".repeat(60));
}

/// Drive the solver directly and print its conflict report.
fn try_solve(title: &str, repo: &InMemoryRepository, roots: &[&str]) {
    header(title);

    let factory = Factory::new(
        repo,
        repo,
        &Pep508RequestConstructor,
        FactoryOptions::from_version_info(&[3, 11]),
    );
    let provider = Pep508DependencyProvider::new(&factory);

    let reqs: Vec<_> = roots
        .iter()
        .map(|s| provider.intern_spec(s).unwrap())
        .collect();
    let problem = Problem::new().requirements(reqs);

    let mut solver = Solver::new(provider);
    match solver.solve(problem) {
        Ok(_solution) => {
            println!("  Resolved successfully (unexpected for this example).");
        }
        Err(UnsolvableOrCancelled::Unsolvable(conflict)) => {
            println!("{}", conflict.display_user_friendly(&solver));
        }
        Err(UnsolvableOrCancelled::Cancelled(_)) => {
            println!("  Cancelled.");
        }
    }
}

fn main() {
    // ── 1. Missing dependency ─────────────────────────────────────────
    {
        let mut repo = InMemoryRepository::new();
        repo.add(pkg("app", "1.0", &["ghost>=1"]));
        try_solve("Missing dependency", &repo, &["app"]);
    }

    // ── 2. Version conflict between two consumers ─────────────────────
    {
        let mut repo = InMemoryRepository::new();
        repo.add(pkg("web", "1.0", &["urllib3>=2"]));
        repo.add(pkg("legacy", "1.0", &["urllib3<2"]));
        repo.add(pkg("urllib3", "1.26.18", &[]));
        repo.add(pkg("urllib3", "2.2.1", &[]));
        try_solve("Version conflict", &repo, &["web", "legacy"]);
    }

    // ── 3. Requires-Python excludes every release ─────────────────────
    {
        let mut repo = InMemoryRepository::new();
        repo.add(
            pkg("modern", "1.0", &[])
                .with_requires_python(VersionSpecifiers::from_str(">=3.12").unwrap()),
        );
        try_solve("Requires-Python conflict", &repo, &["modern"]);
    }

    // ── 4. Metadata cannot be prepared ────────────────────────────────
    {
        header("Broken artifact");
        let repo = InMemoryRepository::new();
        let factory = Factory::new(
            &repo,
            &repo,
            &Pep508RequestConstructor,
            FactoryOptions::from_version_info(&[3, 11]),
        );
        let broken = InstallRequest::from_link(
            Link::new("https://files.example/broken-1.0.tar.gz"),
            Some(PackageName::from_str("broken").unwrap()),
        );
        match resolve(&factory, &[broken]) {
            Err(err @ ResolveError::Metadata { .. }) => {
                println!("  {err}");
                if let Some(source) = std::error::Error::source(&err) {
                    println!("  caused by: {source}");
                }
            }
            other => println!("  unexpected outcome: {other:?}"),
        }
    }
}
