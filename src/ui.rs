use crate::config::CredentialSource;
use crate::state::ConnectionStatus;

pub fn render_index(today: &str, status: &ConnectionStatus) -> String {
    let source = match status.source {
        Some(CredentialSource::Environment) => "environment",
        Some(CredentialSource::File) => "saved settings",
        Some(CredentialSource::Demo) => "demo data",
        None => "not connected",
    };
    let target = status.url.as_deref().unwrap_or("in-memory store");
    INDEX_HTML
        .replace("{{STYLE}}", STYLE)
        .replace("{{TODAY}}", &escape_html(today))
        .replace("{{SOURCE}}", source)
        .replace("{{TARGET}}", &escape_html(target))
        .replace(
            "{{CAN_DISCONNECT}}",
            if status.source == Some(CredentialSource::File) { "" } else { "hidden" },
        )
}

pub fn render_setup(error: Option<&str>) -> String {
    SETUP_HTML
        .replace("{{STYLE}}", STYLE)
        .replace("{{ERROR}}", &escape_html(error.unwrap_or_default()))
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

const STYLE: &str = r#"
    :root {
      --bg-1: #f4f6fb;
      --ink: #1f2937;
      --muted: #6b7280;
      --accent: #2563eb;
      --accent-soft: #eff6ff;
      --danger: #dc2626;
      --ok: #16a34a;
      --warn: #f97316;
      --card: #ffffff;
      --line: rgba(31, 41, 55, 0.1);
      --shadow: 0 18px 40px rgba(31, 41, 55, 0.08);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg-1);
      color: var(--ink);
      font-family: "Inter", "Segoe UI", "Trebuchet MS", sans-serif;
    }

    button {
      appearance: none;
      border: 1px solid var(--line);
      border-radius: 8px;
      padding: 8px 14px;
      font-size: 0.9rem;
      font-weight: 600;
      cursor: pointer;
      background: white;
      color: var(--ink);
    }

    button.primary {
      background: var(--accent);
      border-color: var(--accent);
      color: white;
    }

    button.link {
      border: none;
      background: none;
      padding: 0;
      color: var(--accent);
    }

    button.link.danger {
      color: var(--danger);
    }

    button:disabled {
      opacity: 0.5;
      cursor: not-allowed;
    }

    input, select {
      width: 100%;
      padding: 9px 11px;
      border: 1px solid #d1d5db;
      border-radius: 8px;
      font-size: 0.9rem;
      background: white;
    }

    input[readonly] {
      background: #f9fafb;
      color: var(--muted);
    }

    label {
      display: block;
      font-size: 0.8rem;
      font-weight: 600;
      color: #374151;
      margin-bottom: 4px;
    }

    .card {
      background: var(--card);
      border-radius: 14px;
      box-shadow: var(--shadow);
      padding: 24px;
    }

    .status {
      font-size: 0.9rem;
      min-height: 1.2em;
      color: var(--muted);
    }

    .status[data-type="error"] {
      color: var(--danger);
    }
"#;

const SETUP_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Truck Load Manager - Connect</title>
  <style>
{{STYLE}}
    body {
      display: grid;
      place-items: center;
      padding: 32px 18px;
    }

    .setup {
      width: min(460px, 100%);
      display: grid;
      gap: 16px;
    }

    h1 {
      margin: 0;
      font-size: 1.5rem;
    }

    p {
      margin: 0;
      color: var(--muted);
    }
  </style>
</head>
<body>
  <main class="card setup">
    <h1>Connect your database</h1>
    <p>Enter the endpoint URL and API key of the hosted loads table. They are saved on this server and can be cleared later with Disconnect.</p>
    <form id="setup-form" class="setup">
      <div>
        <label for="url">Database URL</label>
        <input id="url" name="url" type="url" placeholder="https://your-project.supabase.co" required />
      </div>
      <div>
        <label for="api-key">API key</label>
        <input id="api-key" name="api_key" type="password" required />
      </div>
      <button class="primary" type="submit">Save and connect</button>
    </form>
    <div class="status" id="status" data-type="error">{{ERROR}}</div>
  </main>

  <script>
    const form = document.getElementById('setup-form');
    const statusEl = document.getElementById('status');

    form.addEventListener('submit', async (event) => {
      event.preventDefault();
      statusEl.textContent = '';
      const body = {
        url: document.getElementById('url').value,
        api_key: document.getElementById('api-key').value
      };
      try {
        const res = await fetch('/api/config', {
          method: 'POST',
          headers: { 'content-type': 'application/json' },
          body: JSON.stringify(body)
        });
        if (!res.ok) {
          throw new Error((await res.text()) || 'Could not save settings');
        }
        window.location.assign('/');
      } catch (err) {
        statusEl.textContent = err.message;
      }
    });
  </script>
</body>
</html>
"#;

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Truck Load Manager</title>
  <style>
{{STYLE}}
    .layout {
      display: grid;
      grid-template-columns: 240px 1fr;
      min-height: 100vh;
    }

    .sidebar {
      background: white;
      border-right: 1px solid var(--line);
      display: flex;
      flex-direction: column;
      justify-content: space-between;
      padding: 20px 16px;
    }

    .sidebar h1 {
      font-size: 1.1rem;
      margin: 0 0 20px;
    }

    .nav a {
      display: block;
      padding: 8px 12px;
      border-radius: 8px;
      text-decoration: none;
      color: var(--muted);
      font-size: 0.9rem;
      font-weight: 600;
    }

    .nav a.current {
      background: var(--accent-soft);
      color: var(--accent);
    }

    .nav a.disabled {
      color: #c0c4cc;
      cursor: not-allowed;
    }

    .connection {
      font-size: 0.8rem;
      color: var(--muted);
      display: grid;
      gap: 8px;
      word-break: break-all;
    }

    .content {
      padding: 28px;
      display: grid;
      gap: 20px;
      align-content: start;
    }

    .tabs {
      display: flex;
      gap: 20px;
      border-bottom: 1px solid var(--line);
    }

    .tab {
      border: none;
      border-radius: 0;
      background: none;
      padding: 10px 2px;
      color: var(--muted);
      border-bottom: 2px solid transparent;
    }

    .tab.active {
      color: var(--accent);
      border-bottom-color: var(--accent);
    }

    .toolbar {
      display: flex;
      flex-wrap: wrap;
      align-items: center;
      justify-content: space-between;
      gap: 12px;
      margin-bottom: 20px;
    }

    .toolbar h2 {
      margin: 0;
      font-size: 1.3rem;
    }

    .toolbar .buttons {
      display: flex;
      gap: 8px;
    }

    .summary {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(150px, 1fr));
      gap: 12px;
      margin-bottom: 20px;
    }

    .metric {
      border: 1px solid var(--line);
      border-radius: 10px;
      padding: 14px;
    }

    .metric .label {
      font-size: 0.8rem;
      color: var(--muted);
    }

    .metric .value {
      font-size: 1.4rem;
      font-weight: 700;
    }

    .metric .sub {
      font-size: 0.75rem;
      color: #9ca3af;
    }

    table {
      width: 100%;
      border-collapse: collapse;
      font-size: 0.88rem;
    }

    th {
      text-align: left;
      font-size: 0.72rem;
      text-transform: uppercase;
      letter-spacing: 0.06em;
      color: var(--muted);
      background: #f9fafb;
      padding: 10px;
    }

    td {
      padding: 12px 10px;
      border-top: 1px solid var(--line);
      vertical-align: top;
    }

    .badge {
      display: inline-block;
      padding: 2px 8px;
      border-radius: 999px;
      font-size: 0.75rem;
      font-weight: 600;
      background: #f3f4f6;
    }

    .badge[data-status="In Transit"] { background: #dbeafe; color: #1e40af; }
    .badge[data-status="Delivered"] { background: #fef9c3; color: #854d0e; }
    .badge[data-status="Invoiced"] { background: #f3e8ff; color: #6b21a8; }
    .badge[data-status="Paid"] { background: #dcfce7; color: #166534; }

    .muted {
      color: var(--muted);
      font-size: 0.78rem;
    }

    .empty {
      text-align: center;
      padding: 40px 0;
      color: var(--muted);
    }

    #chart {
      width: 100%;
      height: 300px;
      display: block;
    }

    .chart-grid { stroke: rgba(31, 41, 55, 0.08); }
    .chart-label { fill: #7a746d; font-size: 11px; }
    .series-empty { stroke: var(--warn); }
    .series-loaded { stroke: var(--ok); }
    .series-total { stroke: var(--accent); stroke-width: 3; }
    .chart-line { fill: none; stroke-width: 2; }

    .legend {
      display: flex;
      gap: 16px;
      font-size: 0.8rem;
      color: var(--muted);
      margin-top: 8px;
    }

    .legend span::before {
      content: "";
      display: inline-block;
      width: 10px;
      height: 10px;
      border-radius: 50%;
      margin-right: 6px;
      background: currentColor;
    }

    .modal-backdrop {
      position: fixed;
      inset: 0;
      background: rgba(17, 24, 39, 0.45);
      display: grid;
      place-items: center;
      padding: 16px;
    }

    .modal-backdrop[hidden] {
      display: none;
    }

    .modal {
      width: min(640px, 100%);
      max-height: 92vh;
      overflow-y: auto;
    }

    .modal h2 {
      margin: 0 0 16px;
    }

    .form-grid {
      display: grid;
      grid-template-columns: 1fr 1fr;
      gap: 14px;
    }

    .form-grid .wide {
      grid-column: 1 / -1;
    }

    .with-button {
      display: flex;
      gap: 6px;
    }

    .autocomplete {
      position: relative;
    }

    .suggestions {
      position: absolute;
      z-index: 10;
      left: 0;
      right: 0;
      margin: 4px 0 0;
      padding: 0;
      list-style: none;
      background: white;
      border: 1px solid var(--line);
      border-radius: 8px;
      box-shadow: var(--shadow);
      max-height: 240px;
      overflow-y: auto;
    }

    .suggestions li {
      padding: 8px 12px;
      cursor: pointer;
    }

    .suggestions li:hover {
      background: var(--accent-soft);
    }

    .total-box {
      background: var(--accent-soft);
      border-radius: 8px;
      text-align: center;
      padding: 10px;
    }

    .total-box strong {
      display: block;
      font-size: 1.6rem;
      color: var(--accent);
    }

    .modal-actions {
      display: flex;
      justify-content: flex-end;
      gap: 8px;
      margin-top: 18px;
    }

    @media (max-width: 800px) {
      .layout {
        grid-template-columns: 1fr;
      }
      .form-grid {
        grid-template-columns: 1fr;
      }
    }
  </style>
</head>
<body>
  <div class="layout">
    <aside class="sidebar">
      <div>
        <h1>Truck Load Manager</h1>
        <nav class="nav">
          <a href="/" class="current" aria-current="page">Load Manager</a>
          <a href="/" class="disabled">Dashboard</a>
          <a href="/" class="disabled">Analytics</a>
        </nav>
      </div>
      <div class="connection">
        <span>Connected via {{SOURCE}}</span>
        <span>{{TARGET}}</span>
        <button type="button" class="link danger" id="disconnect" {{CAN_DISCONNECT}}>Disconnect DB</button>
      </div>
    </aside>

    <main class="content">
      <div class="tabs" role="tablist">
        <button class="tab active" type="button" data-tab="report" role="tab" aria-selected="true">Weekly Report</button>
        <button class="tab" type="button" data-tab="chart" role="tab" aria-selected="false">Load Evolution</button>
      </div>

      <section class="card" id="report-panel">
        <div class="toolbar">
          <h2 id="week-label">Loading...</h2>
          <div class="buttons">
            <button type="button" id="prev-week">Prev</button>
            <button type="button" id="this-week">Today</button>
            <button type="button" id="next-week">Next</button>
            <button type="button" class="primary" id="add-load">Add Load</button>
          </div>
        </div>
        <div class="summary">
          <div class="metric"><div class="label">Loads / Miles</div><div class="value" id="sum-loads">0</div><div class="sub" id="sum-miles">0 mi</div></div>
          <div class="metric"><div class="label">Gross Revenue</div><div class="value" id="sum-revenue">$0.00</div></div>
          <div class="metric"><div class="label">Fuel Cost</div><div class="value" id="sum-fuel">$0.00</div></div>
          <div class="metric"><div class="label">Net Profit</div><div class="value" id="sum-net">$0.00</div></div>
          <div class="metric"><div class="label">Avg $/Mile</div><div class="value" id="sum-avg">$0.00</div></div>
        </div>
        <div id="report-body"></div>
      </section>

      <section class="card" id="chart-panel" hidden>
        <div class="toolbar">
          <h2 id="month-label">Load Evolution (Miles)</h2>
          <div class="buttons">
            <button type="button" id="prev-month">Prev</button>
            <button type="button" id="this-month">This month</button>
            <button type="button" id="next-month">Next</button>
          </div>
        </div>
        <svg id="chart" viewBox="0 0 640 300" role="img" aria-label="Miles per load"></svg>
        <div class="legend">
          <span style="color: var(--warn)">Empty Miles</span>
          <span style="color: var(--ok)">Loaded Miles</span>
          <span style="color: var(--accent)">Total Miles</span>
        </div>
        <div class="status" id="chart-status"></div>
      </section>
    </main>
  </div>

  <div class="modal-backdrop" id="modal" hidden>
    <div class="card modal" role="dialog" aria-modal="true">
      <h2 id="modal-title">Add New Load</h2>
      <form id="load-form" autocomplete="off">
        <div class="form-grid">
          <div class="wide">
            <label for="current_location">Current Location</label>
            <div class="with-button">
              <div class="autocomplete" style="flex: 1">
                <input id="current_location" data-autocomplete placeholder="Ex: Chicago, IL" />
              </div>
              <button type="button" id="locate" title="Use my location">Locate</button>
            </div>
          </div>
          <div class="autocomplete">
            <label for="pickup_location">Pickup Location</label>
            <input id="pickup_location" data-autocomplete placeholder="Ex: Las Vegas, NV" required />
          </div>
          <div class="autocomplete">
            <label for="delivery_location">Delivery Location</label>
            <input id="delivery_location" data-autocomplete placeholder="Ex: Phoenix, AZ" required />
          </div>
          <div>
            <label for="pickup_date">Pickup Date</label>
            <input id="pickup_date" type="date" required />
          </div>
          <div>
            <label for="delivery_date">Delivery Date</label>
            <input id="delivery_date" type="date" />
          </div>
          <div>
            <label for="empty_miles">Empty Miles</label>
            <input id="empty_miles" readonly />
          </div>
          <div>
            <label for="loaded_miles">Loaded Miles</label>
            <input id="loaded_miles" readonly />
          </div>
          <div class="wide total-box">
            <span class="muted">Total Miles</span>
            <strong id="total_miles">0</strong>
          </div>
          <div>
            <label for="rate">Rate ($)</label>
            <input id="rate" type="number" min="0" step="0.01" />
          </div>
          <div>
            <label for="fuel_cost">Fuel Cost ($)</label>
            <input id="fuel_cost" type="number" min="0" step="0.01" />
          </div>
          <div>
            <label for="reference">Reference #</label>
            <input id="reference" />
          </div>
          <div>
            <label for="broker_name">Broker</label>
            <input id="broker_name" />
          </div>
          <div>
            <label for="type">Type</label>
            <input id="type" placeholder="Dry van, Reefer..." />
          </div>
          <div>
            <label for="status">Status</label>
            <select id="status">
              <option>Pending</option>
              <option>In Transit</option>
              <option>Delivered</option>
              <option>Invoiced</option>
              <option>Paid</option>
            </select>
          </div>
        </div>
        <div class="modal-actions">
          <button type="button" id="cancel-load">Cancel</button>
          <button type="submit" class="primary" id="save-load">Save Load</button>
        </div>
      </form>
    </div>
  </div>

  <script>
    const TODAY = '{{TODAY}}';
    const $ = (id) => document.getElementById(id);

    let weekParam = '';
    let monthParam = TODAY.slice(0, 8) + '01';
    let activeTab = 'report';
    let loadsById = new Map();
    let editing = null;

    const formatCurrency = (value) =>
      '$' + Number(value || 0).toLocaleString(undefined, { minimumFractionDigits: 2, maximumFractionDigits: 2 });

    const formatUs = (iso) => {
      if (!iso) {
        return '';
      }
      const [year, month, day] = iso.split('-');
      return `${month}/${day}/${year}`;
    };

    const escapeHtml = (text) =>
      String(text ?? '').replace(/[&<>"']/g, (ch) => ({ '&': '&amp;', '<': '&lt;', '>': '&gt;', '"': '&quot;', "'": '&#39;' })[ch]);

    const readError = async (res, fallback) => {
      const text = await res.text();
      return new Error(text || fallback);
    };

    const request = async (url, options) => {
      const res = await fetch(url, options);
      if (res.status === 503 && (await res.clone().text()) === 'Database is not configured') {
        window.location.assign('/');
      }
      if (!res.ok) {
        throw await readError(res, 'Request failed');
      }
      return res.status === 204 ? null : res.json();
    };

    // Weekly report

    const renderSummary = (summary) => {
      $('sum-loads').textContent = summary.total_loads;
      $('sum-miles').textContent = `${summary.total_miles.toLocaleString()} mi`;
      $('sum-revenue').textContent = formatCurrency(summary.total_revenue);
      $('sum-fuel').textContent = formatCurrency(summary.total_fuel);
      $('sum-net').textContent = formatCurrency(summary.net_profit);
      $('sum-avg').textContent = formatCurrency(summary.avg_per_mile);
    };

    const renderRows = (loads) => {
      if (!loads.length) {
        $('report-body').innerHTML = '<div class="empty">No loads found for this week.</div>';
        return;
      }
      const rows = loads.map((load) => {
        const net = (load.rate || 0) - (load.fuel_cost || 0);
        return `<tr>
          <td><span class="badge" data-status="${escapeHtml(load.status)}">${escapeHtml(load.status)}</span></td>
          <td>${formatUs(load.pickup_date)}</td>
          <td>${escapeHtml(load.pickup_location)} &rarr; ${escapeHtml(load.delivery_location)}
            <div class="muted">${escapeHtml(load.broker_name || 'No Broker')}</div></td>
          <td>${load.total_miles.toLocaleString()}
            <div class="muted">${load.empty_miles ?? '-'} empty / ${load.loaded_miles ?? '-'} loaded</div></td>
          <td>${formatCurrency(load.rate)}</td>
          <td>${formatCurrency(net)}<div class="muted">Fuel: ${formatCurrency(load.fuel_cost)}</div></td>
          <td>
            <button type="button" class="link" data-edit="${escapeHtml(load.id)}">Edit</button>
            <button type="button" class="link danger" data-delete="${escapeHtml(load.id)}">Delete</button>
          </td>
        </tr>`;
      }).join('');
      $('report-body').innerHTML = `<table>
        <thead><tr><th>Status</th><th>Date</th><th>Route / Broker</th><th>Miles</th><th>Rate</th><th>Fuel/Net</th><th>Actions</th></tr></thead>
        <tbody>${rows}</tbody>
      </table>`;
    };

    const loadWeek = async () => {
      $('report-body').innerHTML = '<div class="empty">Loading...</div>';
      try {
        const query = weekParam ? `?week=${weekParam}` : '';
        const report = await request(`/api/loads${query}`);
        loadsById = new Map(report.loads.map((load) => [String(load.id), load]));
        $('week-label').textContent = report.label;
        $('prev-week').dataset.week = report.prev_week;
        $('next-week').dataset.week = report.next_week;
        renderSummary(report.summary);
        renderRows(report.loads);
      } catch (err) {
        console.error(err);
        $('report-body').innerHTML = `<div class="empty status" data-type="error">${escapeHtml(err.message)}</div>`;
      }
    };

    // Monthly chart

    const renderLineChart = (points) => {
      const chartEl = $('chart');
      if (!points.length) {
        chartEl.innerHTML = '<text class="chart-label" x="50%" y="50%" text-anchor="middle">Add a load to see the evolution chart.</text>';
        return;
      }

      const width = 640;
      const height = 300;
      const paddingX = 48;
      const paddingY = 36;
      const top = 20;
      const series = [
        { key: 'empty_miles', className: 'series-empty' },
        { key: 'loaded_miles', className: 'series-loaded' },
        { key: 'total_miles', className: 'series-total' }
      ];

      const max = Math.max(1, ...points.map((point) => point.total_miles));
      const xStep = points.length > 1 ? (width - paddingX * 2) / (points.length - 1) : 0;
      const scaleY = (height - top - paddingY) / max;
      const x = (index) => (points.length > 1 ? paddingX + index * xStep : width / 2);
      const y = (value) => height - paddingY - value * scaleY;

      let grid = '';
      const ticks = 4;
      for (let i = 0; i <= ticks; i += 1) {
        const value = (max * i) / ticks;
        grid += `<line class="chart-grid" x1="${paddingX}" y1="${y(value)}" x2="${width - paddingX}" y2="${y(value)}" />`;
        grid += `<text class="chart-label" x="${paddingX - 8}" y="${y(value) + 4}" text-anchor="end">${Math.round(value)}</text>`;
      }

      const lines = series.map(({ key, className }) => {
        const path = points
          .map((point, index) => `${index === 0 ? 'M' : 'L'} ${x(index).toFixed(2)} ${y(point[key]).toFixed(2)}`)
          .join(' ');
        const dots = points
          .map((point, index) => `<circle class="${className}" fill="white" stroke-width="2" cx="${x(index)}" cy="${y(point[key])}" r="3"><title>${escapeHtml(point.label)} (${formatUs(point.date)}): ${point[key]} mi</title></circle>`)
          .join('');
        return `<path class="chart-line ${className}" d="${path}" />${dots}`;
      }).join('');

      const labelEvery = points.length > 10 ? 2 : 1;
      const labels = points
        .map((point, index) => (index % labelEvery === 0
          ? `<text class="chart-label" x="${x(index)}" y="${height - paddingY + 18}" text-anchor="middle">${escapeHtml(point.label)}</text>`
          : ''))
        .join('');

      chartEl.innerHTML = `${grid}${lines}${labels}`;
    };

    const shiftMonth = (iso, offset) => {
      const [year, month] = iso.split('-').map(Number);
      const index = year * 12 + (month - 1) + offset;
      const nextYear = Math.floor(index / 12);
      const nextMonth = String((index % 12) + 1).padStart(2, '0');
      return `${nextYear}-${nextMonth}-01`;
    };

    const loadChart = async () => {
      $('chart-status').textContent = 'Loading...';
      $('chart-status').dataset.type = '';
      try {
        const chart = await request(`/api/chart/monthly?month=${monthParam}`);
        $('month-label').textContent = `Load Evolution (Miles) - ${chart.label}`;
        renderLineChart(chart.points);
        $('chart-status').textContent = '';
      } catch (err) {
        console.error(err);
        $('chart-status').textContent = err.message;
        $('chart-status').dataset.type = 'error';
      }
    };

    // Tabs

    const tabs = Array.from(document.querySelectorAll('.tab'));
    const setActiveTab = (tab) => {
      activeTab = tab;
      tabs.forEach((button) => {
        const isActive = button.dataset.tab === tab;
        button.classList.toggle('active', isActive);
        button.setAttribute('aria-selected', String(isActive));
      });
      $('report-panel').hidden = tab !== 'report';
      $('chart-panel').hidden = tab !== 'chart';
      if (tab === 'chart') {
        loadChart();
      } else {
        loadWeek();
      }
    };
    tabs.forEach((button) => button.addEventListener('click', () => setActiveTab(button.dataset.tab)));

    // Autocomplete

    const closeSuggestions = () => {
      document.querySelectorAll('.suggestions').forEach((list) => list.remove());
    };

    const showSuggestions = async (input) => {
      closeSuggestions();
      const query = input.value;
      if (!query) {
        return;
      }
      try {
        const { suggestions } = await request(`/api/cities?q=${encodeURIComponent(query)}`);
        if (!suggestions.length || document.activeElement !== input) {
          return;
        }
        const list = document.createElement('ul');
        list.className = 'suggestions';
        suggestions.forEach((name) => {
          const item = document.createElement('li');
          item.textContent = name;
          item.addEventListener('mousedown', (event) => {
            event.preventDefault();
            input.value = name;
            closeSuggestions();
            refreshMileage();
          });
          list.appendChild(item);
        });
        input.parentElement.appendChild(list);
      } catch (err) {
        console.error(err);
      }
    };

    document.querySelectorAll('[data-autocomplete]').forEach((input) => {
      input.addEventListener('input', () => showSuggestions(input));
      input.addEventListener('focus', () => showSuggestions(input));
      input.addEventListener('blur', closeSuggestions);
      input.addEventListener('change', () => refreshMileage());
    });

    // Mileage preview

    const refreshMileage = async () => {
      const params = new URLSearchParams({
        current: $('current_location').value,
        pickup: $('pickup_location').value,
        delivery: $('delivery_location').value
      });
      try {
        const mileage = await request(`/api/mileage?${params}`);
        $('empty_miles').value = mileage.empty_miles ?? '';
        $('loaded_miles').value = mileage.loaded_miles ?? '';
        $('total_miles').textContent = mileage.total_miles;
      } catch (err) {
        console.error(err);
      }
    };

    $('locate').addEventListener('click', () => {
      if (!navigator.geolocation) {
        alert('Geolocation is not supported by this browser.');
        return;
      }
      $('locate').disabled = true;
      navigator.geolocation.getCurrentPosition(
        (position) => {
          const { latitude, longitude } = position.coords;
          $('current_location').value = `Lat: ${latitude.toFixed(4)}, Lon: ${longitude.toFixed(4)}`;
          $('locate').disabled = false;
          refreshMileage();
        },
        (error) => {
          console.error('Error getting location', error);
          alert('Could not get location. Check your browser permissions.');
          $('locate').disabled = false;
        }
      );
    });

    // Add / edit modal

    const TEXT_FIELDS = ['current_location', 'pickup_location', 'delivery_location', 'reference', 'broker_name', 'type'];

    const openModal = (load) => {
      editing = load || null;
      $('modal-title').textContent = load ? 'Edit Load' : 'Add New Load';
      TEXT_FIELDS.forEach((field) => {
        $(field).value = load ? (load[field] ?? '') : '';
      });
      $('pickup_date').value = load ? load.pickup_date : TODAY;
      $('delivery_date').value = load ? (load.delivery_date ?? '') : '';
      $('rate').value = load ? (load.rate ?? '') : '';
      $('fuel_cost').value = load ? (load.fuel_cost ?? '') : '';
      $('status').value = load ? load.status : 'Pending';
      $('empty_miles').value = load ? (load.empty_miles ?? '') : '';
      $('loaded_miles').value = load ? (load.loaded_miles ?? '') : '';
      $('total_miles').textContent = load ? load.total_miles : 0;
      $('modal').hidden = false;
      $('pickup_location').focus();
    };

    const closeModal = () => {
      $('modal').hidden = true;
      editing = null;
      closeSuggestions();
    };

    const numberOrNull = (id) => {
      const raw = $(id).value.trim();
      return raw === '' ? null : Number(raw);
    };

    const textOrNull = (id) => {
      const raw = $(id).value.trim();
      return raw === '' ? null : raw;
    };

    const collectForm = () => ({
      current_location: $('current_location').value.trim(),
      pickup_location: $('pickup_location').value.trim(),
      delivery_location: $('delivery_location').value.trim(),
      pickup_date: textOrNull('pickup_date'),
      delivery_date: textOrNull('delivery_date'),
      reference: textOrNull('reference'),
      rate: numberOrNull('rate'),
      fuel_cost: numberOrNull('fuel_cost'),
      type: textOrNull('type'),
      broker_name: textOrNull('broker_name'),
      status: $('status').value
    });

    $('load-form').addEventListener('submit', async (event) => {
      event.preventDefault();
      const body = collectForm();
      if (!body.pickup_location || !body.delivery_location || !body.pickup_date) {
        alert('Please fill in the pickup location, delivery location and pickup date.');
        return;
      }
      if (editing) {
        ['current_location', 'pickup_location', 'delivery_location'].forEach((field) => {
          if ((editing[field] || '') === body[field]) {
            delete body[field];
          }
        });
      }

      $('save-load').disabled = true;
      try {
        if (editing) {
          await request(`/api/loads/${encodeURIComponent(editing.id)}`, {
            method: 'PATCH',
            headers: { 'content-type': 'application/json' },
            body: JSON.stringify(body)
          });
        } else {
          await request('/api/loads', {
            method: 'POST',
            headers: { 'content-type': 'application/json' },
            body: JSON.stringify(body)
          });
        }
        closeModal();
        loadWeek();
      } catch (err) {
        console.error(err);
        alert(err.message);
      } finally {
        $('save-load').disabled = false;
      }
    });

    $('report-body').addEventListener('click', async (event) => {
      const editId = event.target.dataset.edit;
      const deleteId = event.target.dataset.delete;
      if (editId) {
        openModal(loadsById.get(editId));
      } else if (deleteId) {
        if (!confirm('Delete this load? This cannot be undone.')) {
          return;
        }
        try {
          await request(`/api/loads/${encodeURIComponent(deleteId)}`, { method: 'DELETE' });
          loadWeek();
        } catch (err) {
          console.error(err);
          alert(err.message);
        }
      }
    });

    $('add-load').addEventListener('click', () => openModal(null));
    $('cancel-load').addEventListener('click', closeModal);
    $('modal').addEventListener('mousedown', (event) => {
      if (event.target === $('modal')) {
        closeModal();
      }
    });

    // Navigation

    $('prev-week').addEventListener('click', (event) => {
      weekParam = event.target.dataset.week || '';
      loadWeek();
    });
    $('next-week').addEventListener('click', (event) => {
      weekParam = event.target.dataset.week || '';
      loadWeek();
    });
    $('this-week').addEventListener('click', () => {
      weekParam = '';
      loadWeek();
    });
    $('prev-month').addEventListener('click', () => {
      monthParam = shiftMonth(monthParam, -1);
      loadChart();
    });
    $('next-month').addEventListener('click', () => {
      monthParam = shiftMonth(monthParam, 1);
      loadChart();
    });
    $('this-month').addEventListener('click', () => {
      monthParam = TODAY.slice(0, 8) + '01';
      loadChart();
    });

    $('disconnect').addEventListener('click', async () => {
      if (!confirm('Disconnect from the database? You will need to enter the credentials again.')) {
        return;
      }
      try {
        await request('/api/config', { method: 'DELETE' });
        window.location.assign('/');
      } catch (err) {
        alert(err.message);
      }
    });

    setActiveTab(activeTab);
  </script>
</body>
</html>
"#;
