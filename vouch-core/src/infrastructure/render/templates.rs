// vouch-core/src/infrastructure/render/templates.rs

// --- EMBEDDED HTML TEMPLATES (single file pages, no external assets) ---

pub(super) const BASE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{{ title }}</title>
    <style>
        body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif; margin: 2rem; color: #1f2937; }
        h1 { font-size: 1.5rem; margin-bottom: 0.25rem; }
        .subtitle { color: #6b7280; margin-top: 0; }
        table { border-collapse: collapse; width: 100%; margin-top: 1rem; }
        th, td { border-bottom: 1px solid #e5e7eb; padding: 0.5rem; text-align: left; vertical-align: top; }
        th { background: #f9fafb; font-weight: 600; }
        .ok { color: #047857; font-weight: 600; }
        .ko { color: #b91c1c; font-weight: 600; }
        .muted { color: #6b7280; font-size: 0.9em; }
        .stats span { margin-right: 1.5rem; }
        pre { background: #f3f4f6; padding: 0.75rem; overflow-x: auto; }
    </style>
</head>
<body>
    <h1>{{ title }}</h1>
    {% block body %}{% endblock %}
</body>
</html>
"#;

pub(super) const VALIDATION: &str = r#"{% extends "base.html" %}
{% block body %}
<p class="subtitle">Batch <code>{{ batch }}</code>{% if run_name %} &middot; run <code>{{ run_name }}</code>{% endif %}</p>
<p class="{{ 'ok' if success else 'ko' }}">{{ 'Succeeded' if success else 'Failed' }}</p>
<p class="stats">
    <span>Evaluated: {{ stats.evaluated }}</span>
    <span>Successful: {{ stats.successful }}</span>
    <span>Unsuccessful: {{ stats.unsuccessful }}</span>
    <span>Success: {{ stats.success_percent }}%</span>
</p>
<table>
    <thead>
        <tr><th>#</th><th>Column</th><th>Expectation</th><th>Severity</th><th>Status</th><th>Observed</th><th>Sample unexpected values</th></tr>
    </thead>
    <tbody>
    {% for row in rows %}
        <tr>
            <td>{{ loop.index }}</td>
            <td><code>{{ row.column }}</code></td>
            <td>{{ row.rule }}<br><span class="muted">{{ row.description }}</span>{% if row.notes %}<br><span class="muted">{{ row.notes }}</span>{% endif %}</td>
            <td>{{ row.severity }}</td>
            <td class="{{ 'ok' if row.met else 'ko' }}">{{ 'met' if row.met else 'not met' }}</td>
            <td>{{ row.observed }}</td>
            <td>{{ row.partial }}</td>
        </tr>
    {% endfor %}
    </tbody>
</table>
{% endblock %}
"#;

pub(super) const REGISTRY: &str = r#"{% extends "base.html" %}
{% block body %}
<p class="subtitle">{{ rules | length }} expectation(s)</p>
<table>
    <thead>
        <tr><th>#</th><th>Column</th><th>Expectation</th><th>Tolerance</th><th>Severity</th><th>Notes</th></tr>
    </thead>
    <tbody>
    {% for rule in rules %}
        <tr>
            <td>{{ loop.index }}</td>
            <td><code>{{ rule.column }}</code></td>
            <td>{{ rule.rule }}<br><span class="muted">{{ rule.description }}</span></td>
            <td>{{ rule.tolerance }}</td>
            <td>{{ rule.severity }}</td>
            <td>{{ rule.notes }}</td>
        </tr>
    {% endfor %}
    </tbody>
</table>
{% if meta %}<h2>Meta</h2>
<pre>{{ meta }}</pre>{% endif %}
{% endblock %}
"#;

pub(super) const PROFILE: &str = r#"{% extends "base.html" %}
{% block body %}
<p class="subtitle">Batch <code>{{ batch }}</code> &middot; {{ row_count }} row(s) &middot; candidate registry <code>{{ registry }}</code></p>
{% for column in columns %}
<h2><code>{{ column.name }}</code></h2>
<p class="muted">{{ column.missing }} missing of {{ column.elements }}</p>
<ul>
    {% for rule in column.rules %}<li>{{ rule }}</li>
    {% endfor %}
</ul>
{% endfor %}
{% endblock %}
"#;

pub(super) const INDEX: &str = r#"{% extends "base.html" %}
{% block body %}
<h2>Validation results</h2>
{% if entries %}
<table>
    <thead>
        <tr><th>Run</th><th>Registry</th><th>Batch</th><th>Status</th><th>Success</th></tr>
    </thead>
    <tbody>
    {% for entry in entries %}
        <tr>
            <td><a href="validations/{{ entry.registry }}/{{ entry.run_name }}/{{ entry.fingerprint }}.html">{{ entry.run_name }}</a></td>
            <td>{{ entry.registry }}</td>
            <td>{{ entry.batch }}</td>
            <td class="{{ 'ok' if entry.success else 'ko' }}">{{ 'Succeeded' if entry.success else 'Failed' }}</td>
            <td>{{ entry.success_percent }}%</td>
        </tr>
    {% endfor %}
    </tbody>
</table>
{% else %}
<p class="muted">No validation results yet.</p>
{% endif %}
<h2>Expectation registries</h2>
<ul>
{% for name in registries %}    <li><a href="expectations/{{ name }}.html">{{ name }}</a></li>
{% endfor %}</ul>
{% endblock %}
"#;
