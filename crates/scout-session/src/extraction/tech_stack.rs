use super::{matching_names, rule_pattern, Rule};

// Frameworks
rule_pattern!(RE_REACT, r#"(?i)\breact(?:-dom)?\b|\.jsx\b|\.tsx\b|from ['"]react['"]"#);
rule_pattern!(RE_NEXT, r"(?i)\bnext(?:\.js|js)?\b.*\b(?:page|app|router)\b|next\.config\.|\bnext/");
rule_pattern!(RE_VUE, r"(?i)\bvue(?:\.js)?\b|\.vue\b");
rule_pattern!(RE_SVELTE, r"(?i)\bsvelte(?:kit)?\b|\.svelte\b");
rule_pattern!(RE_ANGULAR, r"(?i)@angular/|\bangular\b");
rule_pattern!(RE_EXPRESS, r#"(?i)\bexpress\b|require\(['"]express['"]\)"#);
rule_pattern!(RE_FASTAPI, r"(?i)\bfastapi\b");
rule_pattern!(RE_DJANGO, r"(?i)\bdjango\b|manage\.py");
rule_pattern!(RE_FLASK, r"(?i)\bflask\b");
rule_pattern!(RE_RAILS, r"(?i)\brails\b|Gemfile");
rule_pattern!(RE_AXUM, r"(?i)\baxum\b");
rule_pattern!(RE_ACTIX, r"(?i)\bactix(?:-web|_web)?\b");
rule_pattern!(RE_SPRING, r"(?i)\bspring(?:boot|framework| boot)\b|@SpringBootApplication");
// Languages and runtimes
rule_pattern!(RE_RUST, r"(?i)\bcargo\b|Cargo\.toml|\.rs\b|\brustc\b");
rule_pattern!(RE_TYPESCRIPT, r"(?i)\btypescript\b|\btsc\b|tsconfig\.json|\.tsx?\b");
rule_pattern!(RE_PYTHON, r"(?i)\bpython3?\b|\bpip\b|\.py\b|pyproject\.toml");
rule_pattern!(RE_GO, r"(?i)\bgo (?:build|run|test|mod)\b|go\.mod|\.go\b");
rule_pattern!(RE_NODE, r"(?i)\bnode(?:\.js)?\b|\bnpm\b|\bpnpm\b|\byarn\b|package\.json");
// Data stores
rule_pattern!(RE_POSTGRES, r"(?i)\bpostgres(?:ql)?\b|\bpsql\b|\bpg_");
rule_pattern!(RE_MYSQL, r"(?i)\bmysql\b|\bmariadb\b");
rule_pattern!(RE_SQLITE, r"(?i)\bsqlite3?\b|rusqlite");
rule_pattern!(RE_REDIS, r"(?i)\bredis\b");
rule_pattern!(RE_MONGODB, r"(?i)\bmongo(?:db|ose)?\b");
rule_pattern!(RE_PRISMA, r"(?i)\bprisma\b");
// Infrastructure and tooling
rule_pattern!(RE_DOCKER, r"(?i)\bdocker(?:file|-compose)?\b|Dockerfile");
rule_pattern!(RE_KUBERNETES, r"(?i)\bkubectl\b|\bkubernetes\b|\bk8s\b|\bhelm\b");
rule_pattern!(RE_GRAPHQL, r"(?i)\bgraphql\b|\.graphql\b|\bapollo\b");
rule_pattern!(RE_TAILWIND, r"(?i)\btailwind(?:css)?\b");
rule_pattern!(RE_TOKIO, r"(?i)\btokio\b");

pub fn all_rules() -> Vec<Rule> {
    vec![
        Rule {
            name: "next.js",
            regex: &RE_NEXT,
        },
        Rule {
            name: "react",
            regex: &RE_REACT,
        },
        Rule {
            name: "vue",
            regex: &RE_VUE,
        },
        Rule {
            name: "svelte",
            regex: &RE_SVELTE,
        },
        Rule {
            name: "angular",
            regex: &RE_ANGULAR,
        },
        Rule {
            name: "express",
            regex: &RE_EXPRESS,
        },
        Rule {
            name: "fastapi",
            regex: &RE_FASTAPI,
        },
        Rule {
            name: "django",
            regex: &RE_DJANGO,
        },
        Rule {
            name: "flask",
            regex: &RE_FLASK,
        },
        Rule {
            name: "rails",
            regex: &RE_RAILS,
        },
        Rule {
            name: "axum",
            regex: &RE_AXUM,
        },
        Rule {
            name: "actix",
            regex: &RE_ACTIX,
        },
        Rule {
            name: "spring",
            regex: &RE_SPRING,
        },
        Rule {
            name: "rust",
            regex: &RE_RUST,
        },
        Rule {
            name: "typescript",
            regex: &RE_TYPESCRIPT,
        },
        Rule {
            name: "python",
            regex: &RE_PYTHON,
        },
        Rule {
            name: "go",
            regex: &RE_GO,
        },
        Rule {
            name: "node",
            regex: &RE_NODE,
        },
        Rule {
            name: "postgres",
            regex: &RE_POSTGRES,
        },
        Rule {
            name: "mysql",
            regex: &RE_MYSQL,
        },
        Rule {
            name: "sqlite",
            regex: &RE_SQLITE,
        },
        Rule {
            name: "redis",
            regex: &RE_REDIS,
        },
        Rule {
            name: "mongodb",
            regex: &RE_MONGODB,
        },
        Rule {
            name: "prisma",
            regex: &RE_PRISMA,
        },
        Rule {
            name: "docker",
            regex: &RE_DOCKER,
        },
        Rule {
            name: "kubernetes",
            regex: &RE_KUBERNETES,
        },
        Rule {
            name: "graphql",
            regex: &RE_GRAPHQL,
        },
        Rule {
            name: "tailwind",
            regex: &RE_TAILWIND,
        },
        Rule {
            name: "tokio",
            regex: &RE_TOKIO,
        },
    ]
}

/// Backend web frameworks.
pub const BACKEND_FRAMEWORKS: &[&str] = &[
    "express", "fastapi", "django", "flask", "rails", "axum", "actix", "spring",
];

/// Frontend UI frameworks.
pub const FRONTEND_FRAMEWORKS: &[&str] = &["react", "next.js", "vue", "svelte", "angular"];

/// Relational and document stores.
pub const DATABASES: &[&str] = &["postgres", "mysql", "sqlite", "mongodb"];

pub fn detect_tech(text: &str) -> Vec<&'static str> {
    matching_names(&all_rules(), text)
}
