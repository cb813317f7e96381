//! Dashboard page rendering.
//!
//! The dashboard is one table with a row per chat. Sorting, filtering,
//! category toggles and column visibility all run client side; the chosen
//! state is kept in `localStorage` and expires after a fixed window.

use std::io::{self, Write};

use super::{escape_html, render_timestamp, script_json, write_head};
use crate::error::{Result, ViewerError};
use crate::model::{Category, DashboardEntry};
use crate::util::format_size;

/// Settings that shape the rendered dashboard.
#[derive(Debug, Clone)]
pub struct DashboardOptions {
    /// Page title.
    pub title: String,
    /// Categories offered as filter checkboxes.
    pub enabled_categories: Vec<Category>,
    /// Inactivity window, for tooltips.
    pub inactive_days: u32,
    /// Short threshold in KB, for tooltips.
    pub short_max_kb: u64,
    /// How long saved UI state stays valid.
    pub state_ttl_hours: u64,
    /// `localStorage` key for saved UI state.
    pub state_key: String,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            title: "Claude Code Chats".to_string(),
            enabled_categories: vec![Category::Active],
            inactive_days: 5,
            short_max_kb: 40,
            state_ttl_hours: 5,
            state_key: "ccv-dashboard-state".to_string(),
        }
    }
}

impl DashboardOptions {
    fn tooltip(&self, category: Category) -> String {
        match category {
            Category::Active => format!("Used within the last {} days", self.inactive_days),
            Category::Short => format!(
                "Inactive for more than {} days and smaller than {} KB",
                self.inactive_days, self.short_max_kb
            ),
            Category::Archived => format!("Inactive for more than {} days", self.inactive_days),
        }
    }
}

/// A table column: key, header label, whether hidden by default.
struct Column {
    key: &'static str,
    label: &'static str,
    optional: bool,
}

const COLUMNS: &[Column] = &[
    Column { key: "name", label: "Name", optional: false },
    Column { key: "project", label: "Project", optional: false },
    Column { key: "category", label: "Category", optional: false },
    Column { key: "created", label: "Created", optional: false },
    Column { key: "last-used", label: "Last Used", optional: false },
    Column { key: "messages", label: "Msgs", optional: false },
    Column { key: "uuid", label: "UUID", optional: true },
    Column { key: "branch", label: "Branch", optional: true },
    Column { key: "size", label: "Size", optional: true },
    Column { key: "first-prompt", label: "First prompt", optional: true },
];

/// Render the dashboard document.
///
/// Rows keep the order of `entries`; that order is also the tie-breaker for
/// client-side sorting.
pub fn render_dashboard(entries: &[DashboardEntry], options: &DashboardOptions) -> Result<String> {
    let mut out = Vec::new();
    write_dashboard(&mut out, entries, options)?;
    String::from_utf8(out).map_err(|e| {
        ViewerError::io(
            "Rendered dashboard is not UTF-8",
            io::Error::new(io::ErrorKind::InvalidData, e),
        )
    })
}

fn write_dashboard<W: Write>(writer: &mut W, entries: &[DashboardEntry], options: &DashboardOptions) -> Result<()> {
    write_head(writer, &options.title, DASHBOARD_STYLES)?;
    writeln!(writer, "</head>")?;
    writeln!(writer, "<body>")?;
    writeln!(writer, "<header class=\"dashboard-header\">")?;
    writeln!(writer, "  <h1>{}</h1>", escape_html(&options.title))?;
    write_counts(writer, entries, options)?;
    writeln!(writer, "</header>")?;

    write_controls(writer, options)?;

    writeln!(writer, "<table id=\"chats\">")?;
    writeln!(writer, "  <thead><tr>")?;
    for column in COLUMNS {
        writeln!(
            writer,
            "    <th data-col=\"{}\"{}>{}<span class=\"sort-indicator\"></span></th>",
            column.key,
            if column.optional { " class=\"optional\"" } else { "" },
            column.label
        )?;
    }
    writeln!(writer, "  </tr></thead>")?;
    writeln!(writer, "  <tbody>")?;
    if entries.is_empty() {
        writeln!(
            writer,
            "    <tr class=\"empty\"><td colspan=\"{}\">No chats yet</td></tr>",
            COLUMNS.len()
        )?;
    }
    for (index, entry) in entries.iter().enumerate() {
        write_row(writer, index, entry, options)?;
    }
    writeln!(writer, "  </tbody>")?;
    writeln!(writer, "</table>")?;

    let settings = serde_json::json!({
        "stateKey": options.state_key,
        "stateTtlMs": options.state_ttl_hours.saturating_mul(3_600_000),
        "categories": options.enabled_categories.iter().map(|c| c.css_class()).collect::<Vec<_>>(),
    });
    writeln!(writer, "<script>const DASHBOARD = {};</script>", script_json(&settings)?)?;
    writeln!(writer, "<script>{DASHBOARD_SCRIPT}</script>")?;
    writeln!(writer, "</body>")?;
    writeln!(writer, "</html>")?;
    Ok(())
}

fn write_counts<W: Write>(writer: &mut W, entries: &[DashboardEntry], options: &DashboardOptions) -> Result<()> {
    write!(writer, "  <p class=\"counts\">{} chats", entries.len())?;
    for category in Category::ALL {
        let count = entries.iter().filter(|e| e.category == category).count();
        if count > 0 || options.enabled_categories.contains(&category) {
            write!(writer, " &middot; {count} {}", category.label().to_lowercase())?;
        }
    }
    writeln!(writer, "</p>")?;
    Ok(())
}

fn write_controls<W: Write>(writer: &mut W, options: &DashboardOptions) -> Result<()> {
    writeln!(writer, "<div class=\"controls\">")?;
    writeln!(writer, "  <input type=\"search\" id=\"filter\" placeholder=\"Filter chats\">")?;
    if options.enabled_categories.len() > 1 {
        writeln!(writer, "  <fieldset class=\"categories\">")?;
        for category in &options.enabled_categories {
            writeln!(
                writer,
                "    <label title=\"{}\"><input type=\"checkbox\" data-category=\"{}\" checked> {}</label>",
                escape_html(&options.tooltip(*category)),
                category.css_class(),
                category.label()
            )?;
        }
        writeln!(writer, "  </fieldset>")?;
    }
    writeln!(writer, "  <fieldset class=\"columns\">")?;
    for column in COLUMNS.iter().filter(|c| c.optional) {
        writeln!(
            writer,
            "    <label><input type=\"checkbox\" data-column=\"{}\"> {}</label>",
            column.key, column.label
        )?;
    }
    writeln!(writer, "  </fieldset>")?;
    writeln!(writer, "  <button type=\"button\" id=\"reset\">Reset</button>")?;
    writeln!(writer, "</div>")?;
    Ok(())
}

fn write_row<W: Write>(writer: &mut W, index: usize, entry: &DashboardEntry, options: &DashboardOptions) -> Result<()> {
    let sort_time = |ts: Option<chrono::DateTime<chrono::Utc>>| ts.map_or(0, |t| t.timestamp());

    writeln!(
        writer,
        "    <tr data-index=\"{index}\" data-category=\"{}\">",
        entry.category.css_class()
    )?;
    writeln!(
        writer,
        "      <td data-col=\"name\" data-sort=\"{0}\"><a href=\"{1}\" title=\"{2}\">{0}</a></td>",
        escape_html(&entry.name),
        escape_html(&entry.link),
        escape_html(&entry.summary)
    )?;
    writeln!(
        writer,
        "      <td data-col=\"project\" title=\"{}\">{}</td>",
        escape_html(&entry.project_full),
        escape_html(&entry.project)
    )?;
    writeln!(
        writer,
        "      <td data-col=\"category\" title=\"{}\"><span class=\"badge {}\">{}</span></td>",
        escape_html(&options.tooltip(entry.category)),
        entry.category.css_class(),
        entry.category.label()
    )?;
    writeln!(
        writer,
        "      <td data-col=\"created\" data-sort=\"{}\">{}</td>",
        sort_time(entry.created),
        time_cell(entry.created)
    )?;
    writeln!(
        writer,
        "      <td data-col=\"last-used\" data-sort=\"{}\">{}</td>",
        sort_time(entry.last_used),
        time_cell(entry.last_used)
    )?;
    writeln!(
        writer,
        "      <td data-col=\"messages\" data-sort=\"{0}\">{0}</td>",
        entry.messages
    )?;
    writeln!(writer, "      <td data-col=\"uuid\" class=\"optional mono\">{}</td>", escape_html(&entry.identity))?;
    writeln!(writer, "      <td data-col=\"branch\" class=\"optional\">{}</td>", escape_html(&entry.branch))?;
    writeln!(
        writer,
        "      <td data-col=\"size\" class=\"optional\" data-sort=\"{}\">{}</td>",
        entry.size,
        format_size(entry.size)
    )?;
    writeln!(
        writer,
        "      <td data-col=\"first-prompt\" class=\"optional\">{}</td>",
        escape_html(&entry.first_prompt)
    )?;
    writeln!(writer, "    </tr>")?;
    Ok(())
}

fn time_cell(ts: Option<chrono::DateTime<chrono::Utc>>) -> String {
    if ts.is_some() {
        render_timestamp(ts)
    } else {
        "-".to_string()
    }
}

const DASHBOARD_STYLES: &str = r#"
    :root {
      --bg-color: #ffffff;
      --text-color: #1a1a1a;
      --header-bg: #f5f5f5;
      --border-color: #dee2e6;
      --accent-color: #0066cc;
      --active-color: #2e7d32;
      --short-color: #8d6e63;
      --archived-color: #757575;
    }
    @media (prefers-color-scheme: dark) {
      :root {
        --bg-color: #1a1a1a;
        --text-color: #e0e0e0;
        --header-bg: #252525;
        --border-color: #404040;
        --accent-color: #4da6ff;
        --active-color: #81c784;
        --short-color: #bcaaa4;
        --archived-color: #9e9e9e;
      }
    }
    * { box-sizing: border-box; }
    body {
      font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, 'Helvetica Neue', Arial, sans-serif;
      margin: 0;
      padding: 20px;
      background-color: var(--bg-color);
      color: var(--text-color);
    }
    h1 { margin: 0 0 6px 0; font-size: 1.6em; }
    .counts { margin: 0 0 16px 0; opacity: 0.7; }
    .controls { display: flex; flex-wrap: wrap; gap: 12px; align-items: center; margin-bottom: 12px; }
    .controls input[type=search] { padding: 6px 10px; min-width: 260px; }
    .controls fieldset { border: 1px solid var(--border-color); border-radius: 6px; padding: 4px 10px; margin: 0; }
    .controls label { margin-right: 8px; cursor: pointer; }
    table { width: 100%; border-collapse: collapse; font-size: 0.92em; }
    th, td { padding: 6px 10px; border-bottom: 1px solid var(--border-color); text-align: left; vertical-align: top; }
    th { background: var(--header-bg); cursor: pointer; user-select: none; position: sticky; top: 0; white-space: nowrap; }
    th[data-col=messages], td[data-col=messages], td[data-col=size] { text-align: right; }
    td[data-col=first-prompt] { max-width: 400px; overflow: hidden; text-overflow: ellipsis; white-space: nowrap; }
    tr:hover td { background: var(--header-bg); }
    a { color: var(--accent-color); text-decoration: none; }
    a:hover { text-decoration: underline; }
    .mono { font-family: 'SF Mono', Monaco, Consolas, 'Liberation Mono', monospace; font-size: 0.85em; }
    .optional { display: none; }
    .show-uuid [data-col=uuid], .show-branch [data-col=branch],
    .show-size [data-col=size], .show-first-prompt [data-col=first-prompt] { display: table-cell; }
    .badge { font-size: 0.8em; font-weight: 600; padding: 1px 8px; border-radius: 10px; border: 1px solid currentColor; }
    .badge.active { color: var(--active-color); }
    .badge.short { color: var(--short-color); }
    .badge.archived { color: var(--archived-color); }
    .sort-indicator { margin-left: 4px; font-size: 0.8em; }
    tr.empty td { text-align: center; opacity: 0.7; padding: 40px; }
"#;

const DASHBOARD_SCRIPT: &str = r#"
(function () {
  document.querySelectorAll('time.ts').forEach(function (el) {
    var d = new Date(el.getAttribute('datetime'));
    if (!isNaN(d)) el.textContent = d.toLocaleString();
  });

  var table = document.getElementById('chats');
  var tbody = table.tBodies[0];
  var rows = Array.prototype.slice.call(tbody.querySelectorAll('tr[data-index]'));
  var filter = document.getElementById('filter');
  var categoryBoxes = Array.prototype.slice.call(document.querySelectorAll('input[data-category]'));
  var columnBoxes = Array.prototype.slice.call(document.querySelectorAll('input[data-column]'));
  var state = { sort: null, dir: 1, filter: '', categories: {}, columns: {} };

  function load() {
    try {
      var saved = JSON.parse(localStorage.getItem(DASHBOARD.stateKey));
      if (!saved || typeof saved.savedAt !== 'number') return;
      if (Date.now() - saved.savedAt > DASHBOARD.stateTtlMs) {
        localStorage.removeItem(DASHBOARD.stateKey);
        return;
      }
      state.sort = saved.sort || null;
      state.dir = saved.dir === -1 ? -1 : 1;
      state.filter = saved.filter || '';
      state.categories = saved.categories || {};
      state.columns = saved.columns || {};
    } catch (e) {
      localStorage.removeItem(DASHBOARD.stateKey);
    }
  }

  function save() {
    try {
      state.savedAt = Date.now();
      localStorage.setItem(DASHBOARD.stateKey, JSON.stringify(state));
    } catch (e) {}
  }

  function cellValue(row, col) {
    var cell = row.querySelector('td[data-col="' + col + '"]');
    if (!cell) return '';
    var v = cell.getAttribute('data-sort');
    return v === null ? cell.textContent.trim().toLowerCase() : v;
  }

  function compare(a, b) {
    if (state.sort) {
      var x = cellValue(a, state.sort), y = cellValue(b, state.sort);
      var nx = Number(x), ny = Number(y);
      var c = (x !== '' && y !== '' && !isNaN(nx) && !isNaN(ny)) ? nx - ny : x.localeCompare(y);
      if (c !== 0) return c * state.dir;
    }
    return Number(a.getAttribute('data-index')) - Number(b.getAttribute('data-index'));
  }

  function visibleText(row) {
    return Array.prototype.filter.call(row.cells, function (cell) {
      return cell.offsetParent !== null || getComputedStyle(cell).display !== 'none';
    }).map(function (cell) { return cell.textContent; }).join(' ').toLowerCase();
  }

  function apply() {
    columnBoxes.forEach(function (box) {
      var col = box.getAttribute('data-column');
      box.checked = !!state.columns[col];
      table.classList.toggle('show-' + col, box.checked);
    });
    categoryBoxes.forEach(function (box) {
      box.checked = state.categories[box.getAttribute('data-category')] !== false;
    });
    filter.value = state.filter;

    var q = state.filter.trim().toLowerCase();
    rows.slice().sort(compare).forEach(function (row) {
      var cat = row.getAttribute('data-category');
      var catShown = DASHBOARD.categories.indexOf(cat) === -1 || state.categories[cat] !== false;
      var textShown = q === '' || visibleText(row).indexOf(q) !== -1;
      row.style.display = catShown && textShown ? '' : 'none';
      tbody.appendChild(row);
    });

    table.querySelectorAll('th').forEach(function (th) {
      var ind = th.querySelector('.sort-indicator');
      if (ind) ind.textContent = th.getAttribute('data-col') === state.sort ? (state.dir === 1 ? '▲' : '▼') : '';
    });
  }

  table.querySelectorAll('th').forEach(function (th) {
    th.addEventListener('click', function () {
      var col = th.getAttribute('data-col');
      if (state.sort === col) {
        state.dir = -state.dir;
      } else {
        state.sort = col;
        state.dir = 1;
      }
      apply();
      save();
    });
  });
  filter.addEventListener('input', function () { state.filter = filter.value; apply(); save(); });
  categoryBoxes.forEach(function (box) {
    box.addEventListener('change', function () {
      state.categories[box.getAttribute('data-category')] = box.checked;
      apply();
      save();
    });
  });
  columnBoxes.forEach(function (box) {
    box.addEventListener('change', function () {
      state.columns[box.getAttribute('data-column')] = box.checked;
      apply();
      save();
    });
  });
  document.getElementById('reset').addEventListener('click', function () {
    localStorage.removeItem(DASHBOARD.stateKey);
    state = { sort: null, dir: 1, filter: '', categories: {}, columns: {} };
    apply();
  });

  load();
  apply();
})();
"#;
