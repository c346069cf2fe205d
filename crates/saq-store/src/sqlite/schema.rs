//! SQLite schema, applied idempotently on open.

pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS regulation_location (
    regulation_location_id INTEGER PRIMARY KEY,
    city TEXT NOT NULL DEFAULT '' COLLATE NOCASE,
    county TEXT NOT NULL DEFAULT '' COLLATE NOCASE,
    state TEXT NOT NULL COLLATE NOCASE,
    UNIQUE (city, county, state)
);

CREATE TABLE IF NOT EXISTS organization (
    organization_id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE COLLATE NOCASE,
    is_active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS audit_category (
    audit_category_id INTEGER PRIMARY KEY,
    category TEXT NOT NULL COLLATE NOCASE,
    organization_id INTEGER REFERENCES organization (organization_id)
);

CREATE TABLE IF NOT EXISTS license_type (
    license_type_id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE COLLATE NOCASE
);

CREATE TABLE IF NOT EXISTS license_type_vertical (
    license_type_vertical_id INTEGER PRIMARY KEY,
    license_type_id INTEGER NOT NULL REFERENCES license_type (license_type_id) ON DELETE CASCADE,
    name TEXT NOT NULL COLLATE NOCASE,
    UNIQUE (license_type_id, name)
);

CREATE TABLE IF NOT EXISTS license_type_permit (
    license_type_permit_id INTEGER PRIMARY KEY,
    license_type_id INTEGER NOT NULL REFERENCES license_type (license_type_id) ON DELETE CASCADE,
    name TEXT NOT NULL COLLATE NOCASE,
    UNIQUE (license_type_id, name)
);

CREATE TABLE IF NOT EXISTS license_type_vertical_technique (
    license_type_vertical_technique_id INTEGER PRIMARY KEY,
    license_type_vertical_id INTEGER NOT NULL
        REFERENCES license_type_vertical (license_type_vertical_id) ON DELETE CASCADE,
    name TEXT NOT NULL COLLATE NOCASE,
    UNIQUE (license_type_vertical_id, name)
);

CREATE TABLE IF NOT EXISTS policy_requirement (
    policy_requirement_id INTEGER PRIMARY KEY AUTOINCREMENT,
    regulation_location_id INTEGER NOT NULL
        REFERENCES regulation_location (regulation_location_id),
    audit_category_id INTEGER NOT NULL REFERENCES audit_category (audit_category_id),
    code TEXT NOT NULL DEFAULT '',
    chapter TEXT NOT NULL DEFAULT '',
    section TEXT NOT NULL DEFAULT '',
    regulation TEXT NOT NULL DEFAULT '',
    question_order INTEGER,
    is_active INTEGER NOT NULL DEFAULT 1,
    recreational INTEGER NOT NULL DEFAULT 1,
    medicinal INTEGER NOT NULL DEFAULT 1,
    organization_id INTEGER REFERENCES organization (organization_id),
    user_facing_note TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS policy_requirement_license_type (
    policy_requirement_license_type_id INTEGER PRIMARY KEY,
    policy_requirement_id INTEGER NOT NULL
        REFERENCES policy_requirement (policy_requirement_id) ON DELETE CASCADE,
    license_type_id INTEGER NOT NULL REFERENCES license_type (license_type_id),
    UNIQUE (policy_requirement_id, license_type_id)
);

CREATE TABLE IF NOT EXISTS policy_requirement_vertical (
    policy_requirement_vertical_id INTEGER PRIMARY KEY,
    policy_requirement_id INTEGER NOT NULL
        REFERENCES policy_requirement (policy_requirement_id) ON DELETE CASCADE,
    license_type_vertical_id INTEGER NOT NULL
        REFERENCES license_type_vertical (license_type_vertical_id),
    UNIQUE (policy_requirement_id, license_type_vertical_id)
);

CREATE TABLE IF NOT EXISTS policy_requirement_permit (
    policy_requirement_permit_id INTEGER PRIMARY KEY,
    policy_requirement_id INTEGER NOT NULL
        REFERENCES policy_requirement (policy_requirement_id) ON DELETE CASCADE,
    license_type_permit_id INTEGER NOT NULL
        REFERENCES license_type_permit (license_type_permit_id),
    UNIQUE (policy_requirement_id, license_type_permit_id)
);

CREATE TABLE IF NOT EXISTS policy_vertical_technique (
    policy_vertical_technique_id INTEGER PRIMARY KEY,
    policy_requirement_vertical_id INTEGER NOT NULL
        REFERENCES policy_requirement_vertical (policy_requirement_vertical_id) ON DELETE CASCADE,
    license_type_vertical_technique_id INTEGER NOT NULL
        REFERENCES license_type_vertical_technique (license_type_vertical_technique_id),
    UNIQUE (policy_requirement_vertical_id, license_type_vertical_technique_id)
);

CREATE TABLE IF NOT EXISTS policy_compliance (
    policy_compliance_id INTEGER PRIMARY KEY,
    policy_requirement_id INTEGER NOT NULL
        REFERENCES policy_requirement (policy_requirement_id) ON DELETE CASCADE,
    question TEXT NOT NULL,
    non_compliant TEXT NOT NULL CHECK (non_compliant IN ('Yes', 'No')),
    action TEXT NOT NULL DEFAULT '',
    level TEXT NOT NULL CHECK (level IN ('1', '2')),
    trigger_response TEXT NOT NULL DEFAULT '',
    UNIQUE (policy_requirement_id, level)
);
";
