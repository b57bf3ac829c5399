//! HTML pages.
//!
//! Pages are plain strings assembled with `format!`. Every value that originates from
//! a user or from the store goes through [`escape_html`] before it is interpolated.

use pacientes_core::PatientView;
use std::fmt::Write;

/// Blood type codes offered by the form's select box.
pub const BLOOD_TYPES: [&str; 8] = ["A+", "A-", "B+", "B-", "AB+", "AB-", "O+", "O-"];

/// Escapes the five HTML-significant characters.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{title}</title>
  <link rel="stylesheet" href="/styles.css">
</head>
<body>
  <main>
{body}
  </main>
  <script>
    if ('serviceWorker' in navigator) {{
      window.addEventListener('load', function () {{
        navigator.serviceWorker.register('/service-worker.js');
      }});
    }}
  </script>
</body>
</html>
"#,
        title = escape_html(title),
        body = body,
    )
}

/// Landing page with the main menu.
pub fn index_page() -> String {
    layout(
        "Pacientes",
        r#"    <h1>Cadastro de Pacientes</h1>
    <nav class="menu">
      <a class="button" href="/pacientes">Listar pacientes</a>
      <a class="button" href="/criar">Cadastrar paciente</a>
    </nav>"#,
    )
}

/// Table of all patients, in the order given.
pub fn patients_page(patients: &[PatientView]) -> String {
    let mut rows = String::new();
    for patient in patients {
        let id = escape_html(&patient.id);
        let _ = write!(
            rows,
            r#"        <tr>
          <td>{name}</td>
          <td>{birth}</td>
          <td>{weight}</td>
          <td>{height}</td>
          <td>{blood}</td>
          <td class="actions">
            <a class="button" href="/editar/{id}">Editar</a>
            <form method="post" action="/deletar/{id}" onsubmit="return confirm('Tem certeza que deseja excluir este paciente?');">
              <button type="submit" class="danger">Excluir</button>
            </form>
          </td>
        </tr>
"#,
            name = escape_html(&patient.name),
            birth = escape_html(&patient.birth_date),
            weight = escape_html(&patient.weight_display()),
            height = escape_html(&patient.height_display()),
            blood = escape_html(&patient.blood_type),
            id = id,
        );
    }

    let table = if patients.is_empty() {
        "    <p>Nenhum paciente cadastrado.</p>\n".to_string()
    } else {
        format!(
            r#"    <table>
      <thead>
        <tr>
          <th>Nome</th>
          <th>Data de nascimento</th>
          <th>Peso (kg)</th>
          <th>Altura (m)</th>
          <th>Tipo sanguíneo</th>
          <th></th>
        </tr>
      </thead>
      <tbody>
{rows}      </tbody>
    </table>
"#
        )
    };

    layout(
        "Pacientes",
        &format!(
            r#"    <h1>Pacientes</h1>
{table}    <nav class="menu">
      <a class="button" href="/criar">Cadastrar paciente</a>
      <a class="button" href="/">Voltar</a>
    </nav>"#
        ),
    )
}

/// Empty form for a new patient.
pub fn create_page() -> String {
    layout(
        "Cadastrar paciente",
        &format!(
            "    <h1>Cadastrar paciente</h1>\n{}",
            patient_form("/criar", "Cadastrar", None)
        ),
    )
}

/// Form pre-filled with an existing patient.
pub fn edit_page(patient: &PatientView) -> String {
    let action = format!("/editar/{}", patient.id);
    layout(
        "Editar paciente",
        &format!(
            "    <h1>Editar paciente</h1>\n{}",
            patient_form(&action, "Salvar", Some(patient))
        ),
    )
}

fn patient_form(action: &str, submit: &str, patient: Option<&PatientView>) -> String {
    let name = patient.map(|p| p.name.as_str()).unwrap_or_default();
    let birth = patient.map(|p| p.birth_date.as_str()).unwrap_or_default();
    let weight = patient.map(PatientView::weight_display).unwrap_or_default();
    let height = patient.map(PatientView::height_display).unwrap_or_default();
    let blood = patient.map(|p| p.blood_type.as_str()).unwrap_or_default();

    format!(
        r#"    <form method="post" action="{action}">
      <label for="nome_pac">Nome</label>
      <input type="text" id="nome_pac" name="nome_pac" value="{name}">
      <label for="data_nasc_pac">Data de nascimento</label>
      <input type="date" id="data_nasc_pac" name="data_nasc_pac" value="{birth}">
      <label for="peso_pac">Peso (kg)</label>
      <input type="number" step="any" id="peso_pac" name="peso_pac" value="{weight}">
      <label for="alt_pac">Altura (m)</label>
      <input type="number" step="any" id="alt_pac" name="alt_pac" value="{height}">
      <label for="tipo_sang">Tipo sanguíneo</label>
      <select id="tipo_sang" name="tipo_sang">
{options}      </select>
      <div class="menu">
        <button type="submit">{submit}</button>
        <a class="button" href="/pacientes">Cancelar</a>
      </div>
    </form>"#,
        action = escape_html(action),
        name = escape_html(name),
        birth = escape_html(birth),
        weight = escape_html(&weight),
        height = escape_html(&height),
        options = blood_type_options(blood),
        submit = escape_html(submit),
    )
}

/// Options for the blood type select. A stored value outside [`BLOOD_TYPES`] is kept
/// as an extra selected option so editing does not silently drop it.
fn blood_type_options(selected: &str) -> String {
    let mut options = String::new();
    let mut push = |value: &str, label: &str| {
        let marker = if value == selected { " selected" } else { "" };
        let _ = writeln!(
            options,
            r#"        <option value="{value}"{marker}>{label}</option>"#,
            value = escape_html(value),
            label = escape_html(label),
        );
    };

    push("", "Selecione");
    for code in BLOOD_TYPES {
        push(code, code);
    }
    if !selected.is_empty() && !BLOOD_TYPES.contains(&selected) {
        push(selected, selected);
    }
    options
}
