use crate::session::StatsSnapshot;

/// Format token count with K/M suffix
fn format_tokens(count: u64) -> String {
    if count >= 1_000_000 {
        format!("{:.1}M", count as f64 / 1_000_000.0)
    } else if count >= 1_000 {
        format!("{:.1}K", count as f64 / 1_000.0)
    } else {
        count.to_string()
    }
}

/// Color class for the water level bar.
fn level_class(percentage: f64) -> &'static str {
    if percentage < 50.0 {
        "low"
    } else if percentage < 75.0 {
        "medium"
    } else if percentage < 90.0 {
        "high"
    } else {
        "critical"
    }
}

/// Render the main bathtub page with the session's current snapshot. The
/// page JS keeps itself up to date from the JSON endpoints afterwards; the
/// capacity travels on a `data-capacity` attribute so the script never
/// hardcodes it.
pub fn render_index(snapshot: &StatsSnapshot) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>AI Bathtub</title>
    <style>{style}</style>
</head>
<body data-capacity="{capacity}">
    <div class="container">
        <div class="header">
            <h1>AI Bathtub</h1>
            <div class="header-actions">
                <button id="history-button" class="action-btn">History</button>
                <button id="reset-button" class="action-btn danger">Reset</button>
            </div>
        </div>

        <div id="overflow-warning" class="overflow-warning hidden">
            <span>The bathtub has overflowed! Your session has used more tokens than its capacity.</span>
            <button id="acknowledge-overflow">Dismiss</button>
        </div>

        <div class="main-grid">
            <div class="tub-column">
                <div class="section tub-section">
                    <h2 class="section-title">Water Level</h2>
                    <div class="tank">
                        <div id="water-level" class="water {level}" style="height: {percentage:.2}%;"></div>
                        <div id="water-percentage" class="tank-label">{percentage_rounded}%</div>
                    </div>
                </div>
                <div class="stats-grid">
                    <div class="stat-card">
                        <div class="stat-label">Total Tokens</div>
                        <div id="total-tokens" class="stat-value highlight">{total_tokens}</div>
                    </div>
                    <div class="stat-card">
                        <div class="stat-label">CO2 Emitted</div>
                        <div id="total-co2" class="stat-value">{total_co2:.6} kg</div>
                    </div>
                    <div class="stat-card">
                        <div class="stat-label">Water Used</div>
                        <div id="total-water" class="stat-value">{total_water:.1} ml</div>
                    </div>
                    <div class="stat-card">
                        <div class="stat-label">Capacity</div>
                        <div class="stat-value green">{capacity_pretty} tokens</div>
                    </div>
                </div>
            </div>

            <div class="section chat-section">
                <h2 class="section-title">Ask a question</h2>
                <div id="chat-messages" class="chat-messages">
                    <div class="message system">
                        <div class="message-content">Every question fills the tub a little. Ask away, but mind the water line.</div>
                    </div>
                </div>
                <form id="chat-form" class="chat-form">
                    <textarea id="question-input" rows="1" placeholder="Type your question..." autocomplete="off"></textarea>
                    <button id="send-button" type="submit">Send</button>
                </form>
            </div>
        </div>
    </div>

    <div id="history-modal" class="modal">
        <div class="modal-body">
            <div class="modal-header">
                <h2>Conversation History</h2>
                <span class="close">&times;</span>
            </div>
            <div id="history-content"></div>
        </div>
    </div>

    <script>{script}</script>
</body>
</html>"#,
        style = STYLE,
        script = SCRIPT,
        capacity = snapshot.bathtub_capacity,
        capacity_pretty = format_tokens(snapshot.bathtub_capacity),
        level = level_class(snapshot.water_level_percentage),
        percentage = snapshot.water_level_percentage,
        percentage_rounded = snapshot.water_level_percentage.round() as u64,
        total_tokens = snapshot.total_tokens,
        total_co2 = snapshot.total_co2,
        total_water = snapshot.total_water,
    )
}

const STYLE: &str = r#"
* { box-sizing: border-box; margin: 0; padding: 0; }
body {
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
    background: #0f172a;
    color: #e2e8f0;
    min-height: 100vh;
    padding: 2rem;
}
.container { max-width: 1100px; margin: 0 auto; }
h1 {
    font-size: 2rem;
    color: #f8fafc;
    display: flex;
    align-items: center;
    gap: 0.75rem;
}
h1::before {
    content: '';
    display: inline-block;
    width: 12px;
    height: 12px;
    background: #38bdf8;
    border-radius: 50%;
    animation: pulse 2s infinite;
}
@keyframes pulse {
    0%, 100% { opacity: 1; }
    50% { opacity: 0.5; }
}
.header {
    display: flex;
    justify-content: space-between;
    align-items: center;
    margin-bottom: 2rem;
}
.header-actions { display: flex; gap: 0.5rem; }
.action-btn {
    background: #3b82f6;
    color: white;
    border: none;
    padding: 0.5rem 1rem;
    border-radius: 6px;
    cursor: pointer;
    font-size: 0.875rem;
}
.action-btn:hover { background: #2563eb; }
.action-btn.danger { background: #ef4444; }
.action-btn.danger:hover { background: #dc2626; }
.main-grid {
    display: grid;
    grid-template-columns: 340px 1fr;
    gap: 1.5rem;
}
@media (max-width: 800px) { .main-grid { grid-template-columns: 1fr; } }
.section {
    background: #1e293b;
    border-radius: 12px;
    padding: 1.5rem;
    border: 1px solid #334155;
}
.section-title {
    font-size: 1.25rem;
    margin-bottom: 1rem;
    color: #f8fafc;
}
.tub-section { margin-bottom: 1.5rem; }
.tank {
    position: relative;
    height: 260px;
    background: #0f172a;
    border: 2px solid #334155;
    border-radius: 0 0 24px 24px;
    overflow: hidden;
    display: flex;
    align-items: flex-end;
}
.water {
    width: 100%;
    transition: height 0.5s ease;
}
.water.low { background: linear-gradient(180deg, #38bdf8, #0ea5e9); }
.water.medium { background: linear-gradient(180deg, #facc15, #eab308); }
.water.high { background: linear-gradient(180deg, #f97316, #ea580c); }
.water.critical { background: linear-gradient(180deg, #ef4444, #dc2626); }
.tank-label {
    position: absolute;
    top: 50%;
    left: 50%;
    transform: translate(-50%, -50%);
    font-size: 2rem;
    font-weight: 700;
    color: #f8fafc;
    text-shadow: 0 1px 4px rgba(15, 23, 42, 0.8);
}
.stats-grid {
    display: grid;
    grid-template-columns: repeat(2, 1fr);
    gap: 1rem;
}
.stat-card {
    background: #1e293b;
    border-radius: 12px;
    padding: 1rem;
    border: 1px solid #334155;
}
.stat-label {
    font-size: 0.75rem;
    color: #94a3b8;
    text-transform: uppercase;
    letter-spacing: 0.05em;
    margin-bottom: 0.5rem;
}
.stat-value {
    font-size: 1.25rem;
    font-weight: 700;
    color: #f8fafc;
}
.stat-value.highlight { color: #818cf8; }
.stat-value.green { color: #22c55e; }
.chat-section { display: flex; flex-direction: column; min-height: 480px; }
.chat-messages {
    flex: 1;
    overflow-y: auto;
    display: flex;
    flex-direction: column;
    gap: 0.75rem;
    margin-bottom: 1rem;
    max-height: 420px;
}
.message { display: flex; }
.message.user { justify-content: flex-end; }
.message-content {
    max-width: 85%;
    padding: 0.75rem 1rem;
    border-radius: 12px;
    background: #0f172a;
    border: 1px solid #334155;
    white-space: pre-wrap;
    word-break: break-word;
}
.message.user .message-content { background: #1d4ed8; border-color: #1d4ed8; }
.message.system .message-content {
    background: transparent;
    border-style: dashed;
    color: #94a3b8;
    font-style: italic;
}
.chat-form { display: flex; gap: 0.5rem; }
.chat-form textarea {
    flex: 1;
    resize: none;
    background: #0f172a;
    border: 1px solid #334155;
    border-radius: 8px;
    color: #e2e8f0;
    padding: 0.75rem;
    font-family: inherit;
    font-size: 0.95rem;
}
.chat-form button {
    background: #3b82f6;
    color: white;
    border: none;
    padding: 0 1.25rem;
    border-radius: 8px;
    cursor: pointer;
}
.chat-form button:disabled { opacity: 0.5; cursor: wait; }
.overflow-warning {
    display: flex;
    justify-content: space-between;
    align-items: center;
    gap: 1rem;
    background: #7f1d1d;
    border: 1px solid #ef4444;
    border-radius: 12px;
    padding: 1rem 1.5rem;
    margin-bottom: 1.5rem;
}
.overflow-warning button {
    background: #ef4444;
    color: white;
    border: none;
    padding: 0.5rem 1rem;
    border-radius: 6px;
    cursor: pointer;
}
.hidden { display: none !important; }
.modal {
    display: none;
    position: fixed;
    inset: 0;
    background: rgba(15, 23, 42, 0.8);
    z-index: 10;
}
.modal-body {
    background: #1e293b;
    border: 1px solid #334155;
    border-radius: 12px;
    max-width: 700px;
    margin: 5vh auto;
    max-height: 85vh;
    overflow-y: auto;
    padding: 1.5rem;
}
.modal-header {
    display: flex;
    justify-content: space-between;
    align-items: center;
    margin-bottom: 1rem;
}
.close { cursor: pointer; font-size: 1.5rem; color: #94a3b8; }
.history-entry {
    border: 1px solid #334155;
    border-radius: 8px;
    padding: 1rem;
    margin-bottom: 1rem;
}
.history-meta {
    display: flex;
    justify-content: space-between;
    font-size: 0.8rem;
    color: #94a3b8;
    margin-bottom: 0.5rem;
}
.history-text { margin-bottom: 0.5rem; white-space: pre-wrap; }
.history-figures {
    display: flex;
    gap: 1rem;
    font-size: 0.85rem;
    color: #94a3b8;
}
.empty { color: #64748b; font-style: italic; padding: 1rem; text-align: center; }
"#;

const SCRIPT: &str = r#"
const capacity = Number(document.body.dataset.capacity);
const chatForm = document.getElementById('chat-form');
const questionInput = document.getElementById('question-input');
const sendButton = document.getElementById('send-button');
const chatMessages = document.getElementById('chat-messages');
const waterLevel = document.getElementById('water-level');
const waterPercentage = document.getElementById('water-percentage');
const totalTokens = document.getElementById('total-tokens');
const totalCo2 = document.getElementById('total-co2');
const totalWater = document.getElementById('total-water');
const resetButton = document.getElementById('reset-button');
const historyButton = document.getElementById('history-button');
const historyModal = document.getElementById('history-modal');
const historyContent = document.getElementById('history-content');
const overflowWarning = document.getElementById('overflow-warning');
const acknowledgeOverflow = document.getElementById('acknowledge-overflow');
const closeModal = document.querySelector('.close');

function addMessage(type, content) {
    const messageDiv = document.createElement('div');
    messageDiv.className = 'message ' + type;
    const messageContent = document.createElement('div');
    messageContent.className = 'message-content';
    messageContent.textContent = content;
    messageDiv.appendChild(messageContent);
    chatMessages.appendChild(messageDiv);
    chatMessages.scrollTop = chatMessages.scrollHeight;
}

function updateStats(data) {
    totalTokens.textContent = data.total_tokens;
    totalCo2.textContent = data.total_co2.toFixed(6) + ' kg';
    totalWater.textContent = data.total_water.toFixed(1) + ' ml';
}

function updateWaterLevel(percentage) {
    waterLevel.style.height = percentage + '%';
    waterPercentage.textContent = Math.round(percentage) + '%';
    waterLevel.className = 'water ' + levelClass(percentage);
}

function levelClass(percentage) {
    if (percentage < 50) return 'low';
    if (percentage < 75) return 'medium';
    if (percentage < 90) return 'high';
    return 'critical';
}

chatForm.addEventListener('submit', async function(e) {
    e.preventDefault();
    const question = questionInput.value.trim();
    if (!question) return;

    addMessage('user', question);
    questionInput.value = '';
    questionInput.style.height = 'auto';
    sendButton.disabled = true;

    try {
        const response = await fetch('/ask', {
            method: 'POST',
            headers: { 'Content-Type': 'application/json' },
            body: JSON.stringify({ question: question })
        });
        const data = await response.json();

        if (response.ok) {
            addMessage('assistant', data.response);
            updateStats(data);
            updateWaterLevel(data.water_level_percentage);
            if (data.overflowed) overflowWarning.classList.remove('hidden');
        } else if (data.would_overflow) {
            addMessage('system', data.error);
        } else {
            addMessage('system', 'Error: ' + data.error);
        }
    } catch (error) {
        addMessage('system', 'Network error. Please try again.');
    } finally {
        sendButton.disabled = false;
        questionInput.focus();
    }
});

resetButton.addEventListener('click', async function() {
    try {
        const response = await fetch('/reset', { method: 'POST' });
        const data = await response.json();
        if (response.ok) {
            updateStats(data);
            updateWaterLevel(0);
            chatMessages.querySelectorAll('.message:not(.system)').forEach(m => m.remove());
            overflowWarning.classList.add('hidden');
            addMessage('system', data.message);
        }
    } catch (error) {
        addMessage('system', 'Error resetting bathtub. Please try again.');
    }
});

function renderHistoryEntry(entry, index) {
    const wrapper = document.createElement('div');
    wrapper.className = 'history-entry';

    const meta = document.createElement('div');
    meta.className = 'history-meta';
    const label = document.createElement('span');
    label.textContent = 'Question ' + (index + 1);
    const when = document.createElement('span');
    when.textContent = new Date(entry.timestamp).toLocaleString();
    meta.append(label, when);

    const question = document.createElement('div');
    question.className = 'history-text';
    question.textContent = 'Q: ' + entry.question;

    const answer = document.createElement('div');
    answer.className = 'history-text';
    const preview = entry.response.length > 200
        ? entry.response.substring(0, 200) + '...'
        : entry.response;
    answer.textContent = 'A: ' + preview;

    const figures = document.createElement('div');
    figures.className = 'history-figures';
    [
        entry.tokens_used + ' tokens',
        entry.co2_emission.toFixed(6) + ' kg CO2',
        entry.water_used.toFixed(1) + ' ml water'
    ].forEach(text => {
        const span = document.createElement('span');
        span.textContent = text;
        figures.appendChild(span);
    });

    wrapper.append(meta, question, answer, figures);
    return wrapper;
}

historyButton.addEventListener('click', async function() {
    historyContent.replaceChildren();
    try {
        const response = await fetch('/history');
        const history = await response.json();
        if (history.length === 0) {
            const empty = document.createElement('p');
            empty.className = 'empty';
            empty.textContent = 'No conversation history yet.';
            historyContent.appendChild(empty);
        } else {
            history.forEach((entry, index) => {
                historyContent.appendChild(renderHistoryEntry(entry, index));
            });
        }
    } catch (error) {
        const failed = document.createElement('p');
        failed.className = 'empty';
        failed.textContent = 'Error loading conversation history.';
        historyContent.appendChild(failed);
    }
    historyModal.style.display = 'block';
});

closeModal.addEventListener('click', () => { historyModal.style.display = 'none'; });
window.addEventListener('click', (e) => {
    if (e.target === historyModal) historyModal.style.display = 'none';
});
acknowledgeOverflow.addEventListener('click', () => overflowWarning.classList.add('hidden'));

document.addEventListener('keydown', function(e) {
    if ((e.ctrlKey || e.metaKey) && e.key === 'Enter') {
        chatForm.dispatchEvent(new Event('submit'));
    }
    if (e.key === 'Escape') {
        historyModal.style.display = 'none';
        overflowWarning.classList.add('hidden');
    }
});

questionInput.addEventListener('input', function() {
    this.style.height = 'auto';
    this.style.height = Math.min(this.scrollHeight, 100) + 'px';
});

window.addEventListener('load', () => questionInput.focus());
"#;
