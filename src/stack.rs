//! Technology-stack detection from dependency and build descriptors.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// npm dependency names and the label each one implies, in report order.
const NPM_PACKAGES: &[(&[&str], &str)] = &[
    (&["react"], "React"),
    (&["vue"], "Vue"),
    (&["next"], "Next.js"),
    (&["nuxt"], "Nuxt"),
    (&["svelte"], "Svelte"),
    (&["angular"], "Angular"),
    (&["@nestjs/core"], "NestJS"),
    (&["express"], "Express"),
    (&["fastify"], "Fastify"),
    (&["prisma", "@prisma/client"], "Prisma"),
    (&["drizzle-orm"], "Drizzle"),
    (&["typescript"], "TypeScript"),
    (&["vitest"], "Vitest"),
    (&["jest"], "Jest"),
    (&["@playwright/test"], "Playwright"),
    (&["cypress"], "Cypress"),
    (&["storybook", "@storybook/react"], "Storybook"),
    (&["tailwindcss"], "Tailwind"),
];

/// A build descriptor: present if any of `files` exists at the project root.
/// `markers` are case-insensitive substrings of the first existing file.
struct Descriptor {
    files: &'static [&'static str],
    label: &'static str,
    markers: &'static [(&'static str, &'static str)],
}

const fn plain(files: &'static [&'static str], label: &'static str) -> Descriptor {
    Descriptor {
        files,
        label,
        markers: &[],
    }
}

/// Each group contributes at most one descriptor: the first one present.
const ECOSYSTEMS: &[&[Descriptor]] = &[
    &[
        Descriptor {
            files: &["pyproject.toml"],
            label: "Python",
            markers: &[
                ("django", "Django"),
                ("fastapi", "FastAPI"),
                ("flask", "Flask"),
                ("pytest", "Pytest"),
            ],
        },
        plain(&["requirements.txt", "Pipfile"], "Python"),
    ],
    &[Descriptor {
        files: &["go.mod"],
        label: "Go",
        markers: &[("gin-gonic", "Gin"), ("gorilla/mux", "Gorilla"), ("fiber", "Fiber")],
    }],
    &[Descriptor {
        files: &["Cargo.toml"],
        label: "Rust",
        markers: &[("actix", "Actix"), ("axum", "Axum"), ("tokio", "Tokio")],
    }],
    &[
        plain(&["pom.xml"], "Java (Maven)"),
        plain(&["build.gradle.kts"], "Kotlin (Gradle)"),
        plain(&["build.gradle"], "Java (Gradle)"),
    ],
    &[Descriptor {
        files: &["Gemfile"],
        label: "Ruby",
        markers: &[("rails", "Rails")],
    }],
    &[Descriptor {
        files: &["composer.json"],
        label: "PHP",
        markers: &[("laravel", "Laravel")],
    }],
];

const DOTNET_EXTS: &[&str] = &[".csproj", ".sln"];

const DOCKER: Descriptor = plain(&["Dockerfile", "docker-compose.yml"], "Docker");

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageJson {
    #[serde(default)]
    dependencies: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    dev_dependencies: BTreeMap<String, serde_json::Value>,
}

/// Stack labels for the project, in a fixed detection order.
///
/// Unreadable descriptors are skipped; detection never fails.
pub fn detect(project: &Path) -> Vec<&'static str> {
    let mut stack = Vec::new();

    if let Some(pkg) = read_package_json(project) {
        for (names, label) in NPM_PACKAGES {
            let present = names
                .iter()
                .any(|n| pkg.dependencies.contains_key(*n) || pkg.dev_dependencies.contains_key(*n));
            if present {
                stack.push(*label);
            }
        }
    }

    for group in ECOSYSTEMS {
        if let Some(descriptor) = group.iter().find(|d| is_present(project, d)) {
            detect_descriptor(project, descriptor, &mut stack);
        }
    }

    if has_dotnet_project(project) {
        stack.push("C# (.NET)");
    }

    if is_present(project, &DOCKER) {
        stack.push(DOCKER.label);
    }

    stack
}

pub fn stack_line(stack: &[&str]) -> Option<String> {
    if stack.is_empty() {
        None
    } else {
        Some(format!("[Session] Project stack: {}", stack.join(", ")))
    }
}

fn is_present(project: &Path, descriptor: &Descriptor) -> bool {
    descriptor.files.iter().any(|f| project.join(f).exists())
}

fn detect_descriptor(project: &Path, descriptor: &Descriptor, stack: &mut Vec<&'static str>) {
    stack.push(descriptor.label);
    if descriptor.markers.is_empty() {
        return;
    }
    let Some(path) = descriptor
        .files
        .iter()
        .map(|f| project.join(f))
        .find(|p| p.exists())
    else {
        return;
    };
    match fs::read_to_string(&path) {
        Ok(content) => {
            let content = content.to_lowercase();
            for (marker, label) in descriptor.markers {
                if content.contains(marker) {
                    stack.push(*label);
                }
            }
        }
        Err(err) => tracing::debug!(path = %path.display(), error = %err, "unreadable descriptor"),
    }
}

fn read_package_json(project: &Path) -> Option<PackageJson> {
    let path = project.join("package.json");
    let contents = fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&contents) {
        Ok(pkg) => Some(pkg),
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "unparsable package.json");
            None
        }
    }
}

fn has_dotnet_project(project: &Path) -> bool {
    let Ok(entries) = fs::read_dir(project) else {
        return false;
    };
    entries.flatten().any(|entry| {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        DOTNET_EXTS.iter().any(|ext| name.ends_with(ext))
    })
}
