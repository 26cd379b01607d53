pub fn render_index(default_accuracy: u32, default_last_days: u32, poll_interval_secs: u64) -> String {
    INDEX_HTML
        .replace("{{ACCURACY}}", &default_accuracy.to_string())
        .replace("{{LAST_DAYS}}", &default_last_days.to_string())
        .replace("{{POLL_MS}}", &(poll_interval_secs.saturating_mul(1000)).to_string())
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Path Map</title>
  <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css" />
  <style>
    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      height: 100vh;
      display: grid;
      grid-template-rows: auto 1fr;
      font-family: Verdana, Tahoma, Arial, sans-serif;
      font-size: 13px;
    }

    form {
      display: flex;
      flex-wrap: wrap;
      gap: 12px;
      align-items: center;
      padding: 8px 12px;
      background: #eef0f4;
      border-bottom: 1px solid #c8ccd4;
    }

    input[type="number"] {
      width: 72px;
    }

    .picker {
      position: relative;
      display: inline-block;
    }

    .picker-dialog {
      position: absolute;
      z-index: 9999;
      top: 24px;
      left: 0;
      background: silver;
      padding: 4px;
      display: none;
    }

    .picker-dialog table {
      border-collapse: collapse;
    }

    .picker-dialog td {
      width: 26px;
      height: 20px;
      text-align: center;
      cursor: pointer;
    }

    .picker-dialog td.today {
      background: red;
    }

    .picker-dialog td.selected {
      color: yellow;
      font-weight: bold;
    }

    .picker-dialog th.weekend {
      color: red;
    }

    #map {
      height: 100%;
    }
  </style>
</head>
<body>
  <form id="filters" onsubmit="return false;">
    <label>Accuracy &le; <input id="accuracy" type="number" min="1" value="{{ACCURACY}}" /> m</label>
    <label>
      Time filter
      <select id="mode">
        <option value="relative">last days</option>
        <option value="absolute">between dates</option>
      </select>
    </label>
    <span id="relative">
      <input id="lastDays" type="number" min="1" value="{{LAST_DAYS}}" /> days
    </span>
    <span id="absolute" hidden>
      from <span class="picker" data-field="from"></span>
      to <span class="picker" data-field="to"></span>
    </span>
    <span id="status"></span>
  </form>
  <div id="map"></div>

  <script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
  <script>
    const map = L.map('map').setView([0, 0], 0);
    L.tileLayer('https://tile.openstreetmap.org/{z}/{x}/{y}.png', {
      attribution: '&copy; OpenStreetMap contributors'
    }).addTo(map);

    let layer = L.layerGroup().addTo(map);
    let centered = false;
    const pickers = {};

    function pathUrl() {
      const params = new URLSearchParams();
      params.set('accuracy', document.getElementById('accuracy').value);
      const mode = document.getElementById('mode').value;
      params.set('mode', mode);
      if (mode === 'absolute') {
        params.set('from', pickers.from.date);
        params.set('to', pickers.to.date);
      } else {
        params.set('last_days', document.getElementById('lastDays').value);
      }
      return '/api/path?' + params.toString();
    }

    function draw(state) {
      layer.clearLayers();
      const line = state.polyline.map((p) => [p.lat, p.lng]);
      L.polyline(line, { color: '#000080', weight: 2 }).addTo(layer);
      state.markers.forEach((m) => {
        L.marker([m.position.lat, m.position.lng], { title: m.hint })
          .bindPopup(m.hint.replace(/\n/g, '<br>'))
          .addTo(layer);
      });
      state.circles.forEach((c) => {
        L.circle([c.center.lat, c.center.lng], {
          radius: c.radius_m,
          stroke: false,
          fillColor: '#0000FF',
          fillOpacity: 0.07,
          interactive: false
        }).addTo(layer);
      });
      if (!centered && line.length > 0) {
        map.setView([state.center.lat, state.center.lng], state.zoom);
        centered = true;
      }
      document.getElementById('status').textContent =
        line.length + ' points, ' + state.total_distance_km + ' km';
    }

    async function loadPath() {
      try {
        const response = await fetch(pathUrl());
        if (response.ok) {
          draw(await response.json());
        }
      } catch (err) {
        console.warn('path refresh failed', err);
      }
    }

    async function pickerRequest(picker, params) {
      const query = new URLSearchParams({ date_only: 'true', ...params });
      const response = await fetch('/api/calendar?' + query.toString());
      if (!response.ok) {
        return;
      }
      const state = await response.json();
      picker.date = state.date;
      picker.year = state.year;
      picker.month = state.month;
      picker.day = state.day;
      renderPicker(picker, state);
    }

    function renderPicker(picker, state) {
      const root = picker.root;
      const heads = ['Mo', 'Tu', 'We', 'Th', 'Fr', 'Sa', 'Su']
        .map((d, i) => '<th' + (i > 4 ? ' class="weekend"' : '') + '>' + d + '</th>')
        .join('');
      let rows = '';
      for (let row = 0; row < 6; row++) {
        rows += '<tr>';
        for (let col = 0; col < 7; col++) {
          const cell = state.grid.cells[row * 7 + col];
          const cls = [cell.is_today ? 'today' : '', cell.is_selected ? 'selected' : ''].join(' ');
          const label = cell.day === null ? '' : String(cell.day).padStart(2, '0');
          rows += '<td class="' + cls + '" data-row="' + row + '" data-col="' + col + '">' + label + '</td>';
        }
        rows += '</tr>';
      }
      root.innerHTML =
        '<input class="main" readonly size="10" value="' + state.display + '" />' +
        '<div class="picker-dialog"' + (picker.open ? ' style="display:block"' : '') + '>' +
        '<a data-step="years" data-delta="-1">&lt;</a> ' + state.year +
        ' <a data-step="years" data-delta="1">&gt;</a>&nbsp;' +
        '<a data-step="months" data-delta="-1">&lt;</a> ' + String(state.month).padStart(2, '0') +
        ' <a data-step="months" data-delta="1">&gt;</a>' +
        '<table><tr>' + heads + '</tr>' + rows + '</table>' +
        '<button type="button" class="ok">OK</button></div>';
    }

    function current(picker) {
      return { year: picker.year, month: picker.month, day: picker.day };
    }

    function setupPicker(root) {
      const picker = { root, open: false };
      pickers[root.dataset.field] = picker;
      root.addEventListener('click', (event) => {
        const target = event.target;
        if (target.classList.contains('main')) {
          picker.open = !picker.open;
          root.querySelector('.picker-dialog').style.display = picker.open ? 'block' : 'none';
        } else if (target.dataset.step === 'years') {
          pickerRequest(picker, { ...current(picker), add_years: target.dataset.delta });
        } else if (target.dataset.step === 'months') {
          pickerRequest(picker, { ...current(picker), add_months: target.dataset.delta });
        } else if (target.dataset.row !== undefined) {
          pickerRequest(picker, {
            ...current(picker),
            select_row: target.dataset.row,
            select_col: target.dataset.col
          });
        } else if (target.classList.contains('ok')) {
          picker.open = false;
          root.querySelector('.picker-dialog').style.display = 'none';
          loadPath();
        }
      });
      return pickerRequest(picker, {});
    }

    document.getElementById('mode').addEventListener('change', (event) => {
      const absolute = event.target.value === 'absolute';
      document.getElementById('absolute').hidden = !absolute;
      document.getElementById('relative').hidden = absolute;
      loadPath();
    });
    document.getElementById('accuracy').addEventListener('change', loadPath);
    document.getElementById('lastDays').addEventListener('change', loadPath);

    Promise.all(Array.from(document.querySelectorAll('.picker')).map(setupPicker)).then(loadPath);
    setInterval(loadPath, {{POLL_MS}});
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_fills_placeholders() {
        let html = render_index(250, 3, 60);
        assert!(html.contains(r#"value="250""#));
        assert!(html.contains(r#"value="3""#));
        assert!(html.contains("setInterval(loadPath, 60000)"));
        assert!(!html.contains("{{"));
    }
}
