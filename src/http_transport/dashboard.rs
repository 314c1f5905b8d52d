//! Embedded web dashboard
//!
//! A single page served at `/`. It loads `/api/rooms`, follows
//! `/api/stream` for live updates and drives the room control and fleet
//! endpoints.

use axum::response::Html;

/// Main dashboard HTML page
pub async fn dashboard_index() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

const DASHBOARD_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Climate Hub</title>
<style>
  body { font-family: system-ui, sans-serif; margin: 0; background: #f3f5f8; color: #1d2733; }
  header { background: #1d3557; color: #fff; padding: 16px 24px; display: flex; justify-content: space-between; align-items: center; }
  header h1 { margin: 0; font-size: 1.4rem; }
  #status { font-size: 0.85rem; opacity: 0.8; }
  main { padding: 24px; }
  form.add-room { margin-bottom: 20px; display: flex; gap: 8px; }
  #rooms { display: grid; grid-template-columns: repeat(auto-fill, minmax(280px, 1fr)); gap: 16px; }
  .room { background: #fff; border-radius: 8px; padding: 16px; box-shadow: 0 1px 3px rgba(0,0,0,0.12); }
  .room h2 { margin: 0 0 12px; font-size: 1.1rem; display: flex; justify-content: space-between; }
  .room.cooling { border-top: 4px solid #457b9d; }
  .readings { display: grid; grid-template-columns: repeat(3, 1fr); gap: 8px; margin-bottom: 12px; }
  .reading { text-align: center; background: #f1faee; border-radius: 6px; padding: 8px 4px; }
  .reading .value { font-size: 1.2rem; font-weight: 600; }
  .reading .label { font-size: 0.75rem; color: #5c6b7a; }
  .controls label { display: flex; justify-content: space-between; align-items: center; margin: 6px 0; }
  .controls input[type=number] { width: 80px; }
  .updated { font-size: 0.75rem; color: #5c6b7a; margin-top: 8px; }
  button.remove { background: none; border: none; color: #e63946; cursor: pointer; }
</style>
</head>
<body>
<header>
  <h1>Climate Hub</h1>
  <span id="status">connecting…</span>
</header>
<main>
  <form class="add-room" id="add-room">
    <input id="room-id" placeholder="Room id" required>
    <button type="submit">Add room</button>
  </form>
  <div id="rooms"></div>
</main>
<script>
(function () {
  const roomsEl = document.getElementById('rooms');
  const statusEl = document.getElementById('status');

  function formatReading(reading) {
    return reading ? `${reading.value.toFixed(1)} ${reading.unit}` : '--';
  }

  function latestTimestamp(room) {
    const stamps = [room.temperature, room.humidity, room.pressure]
      .filter(Boolean)
      .map(r => new Date(r.captured_at));
    if (stamps.length === 0) return 'no readings yet';
    return 'updated ' + new Date(Math.max(...stamps)).toLocaleTimeString();
  }

  async function post(url, body) {
    try {
      const response = await fetch(url, {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify(body)
      });
      if (!response.ok) {
        const error = await response.json();
        alert(error.error ? error.error.message : response.statusText);
      }
    } catch (e) {
      alert('Request failed: ' + e);
    }
  }

  function roomCard(id) {
    let card = document.getElementById('room-' + id);
    if (card) return card;

    card = document.createElement('div');
    card.className = 'room';
    card.id = 'room-' + id;
    card.innerHTML = `
      <h2><span class="name"></span><button class="remove" title="Remove room">✕</button></h2>
      <div class="readings">
        <div class="reading"><div class="value temperature">--</div><div class="label">Temperature</div></div>
        <div class="reading"><div class="value humidity">--</div><div class="label">Humidity</div></div>
        <div class="reading"><div class="value pressure">--</div><div class="label">Pressure</div></div>
      </div>
      <div class="controls">
        <label>Target (°C) <input type="number" step="0.5" class="target"></label>
        <label>Automatic mode <input type="checkbox" class="auto"></label>
        <label>Cooling <input type="checkbox" class="cooling"></label>
      </div>
      <div class="updated"></div>`;
    card.querySelector('.name').textContent = id;

    const path = '/api/rooms/' + encodeURIComponent(id);
    card.querySelector('.target').addEventListener('change', e =>
      post(path + '/target-temperature', { temperature: parseFloat(e.target.value) }));
    card.querySelector('.auto').addEventListener('change', e =>
      post(path + '/automatic-mode', { auto: e.target.checked }));
    card.querySelector('.cooling').addEventListener('change', e =>
      post(path + '/cooling', { active: e.target.checked }));
    card.querySelector('.remove').addEventListener('click', async () => {
      await fetch('/api/fleet/rooms/' + encodeURIComponent(id), { method: 'DELETE' });
      card.remove();
    });

    roomsEl.appendChild(card);
    return card;
  }

  function render(snapshot) {
    for (const [id, room] of Object.entries(snapshot)) {
      const card = roomCard(id);
      card.querySelector('.temperature').textContent = formatReading(room.temperature);
      card.querySelector('.humidity').textContent = formatReading(room.humidity);
      card.querySelector('.pressure').textContent = formatReading(room.pressure);

      const target = card.querySelector('.target');
      if (document.activeElement !== target) target.value = room.target_temperature;
      card.querySelector('.auto').checked = room.automatic_mode;
      const cooling = card.querySelector('.cooling');
      cooling.checked = room.cooling_active;
      cooling.disabled = room.automatic_mode;
      card.classList.toggle('cooling', room.cooling_active);
      card.querySelector('.updated').textContent = latestTimestamp(room);
    }
    for (const card of Array.from(roomsEl.children)) {
      if (!(card.id.slice(5) in snapshot)) card.remove();
    }
  }

  document.getElementById('add-room').addEventListener('submit', async e => {
    e.preventDefault();
    const input = document.getElementById('room-id');
    await post('/api/fleet/rooms', { room_id: input.value });
    input.value = '';
  });

  fetch('/api/rooms').then(r => r.json()).then(render);

  const events = new EventSource('/api/stream');
  events.addEventListener('snapshot', e => render(JSON.parse(e.data)));
  events.onopen = () => { statusEl.textContent = 'live'; };
  events.onerror = () => { statusEl.textContent = 'reconnecting…'; };
})();
</script>
</body>
</html>
"##;
