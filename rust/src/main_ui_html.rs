use crate::PLACEHOLDER_IMAGE_URL;

pub fn build_main_ui_html() -> String {
    MAIN_UI_HTML.replace("__PLACEHOLDER_IMAGE__", PLACEHOLDER_IMAGE_URL)
}

const MAIN_UI_HTML: &str = r#"<!doctype html>
<html lang="zh-CN">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>图片管理工具</title>
  <style>
    :root {
      --bg: #f1f3f6;
      --panel: #ffffff;
      --line: #d4d9e1;
      --accent: #4653c8;
      --danger: #c0392b;
      --ok: #1e7e4c;
      --text: #22262d;
      --muted: #8a91a0;
      --card-w: 360px;
      --ctrl-h: 28px;
      --font-sm: 12px;
    }
    * { box-sizing: border-box; }
    body {
      margin: 0;
      height: 100vh;
      display: flex;
      flex-direction: column;
      color: var(--text);
      background: var(--bg);
      font-family: "PingFang SC", "Microsoft YaHei", sans-serif;
      font-size: 14px;
    }
    header {
      flex: 0 0 auto;
      display: flex;
      align-items: center;
      justify-content: space-between;
      gap: 12px;
      padding: 8px 16px;
      background: var(--panel);
      border-bottom: 1px solid var(--line);
    }
    .brand h1 { margin: 0; font-size: 15px; }
    .brand p {
      margin: 0;
      font-size: 10px;
      color: var(--muted);
      letter-spacing: 0.2em;
    }
    .toolbar {
      display: flex;
      align-items: center;
      gap: 14px;
    }
    .settings {
      display: flex;
      align-items: center;
      gap: 8px;
      font-size: var(--font-sm);
      color: var(--muted);
    }
    .settings input[type="number"] {
      width: 64px;
      height: var(--ctrl-h);
      border: 1px solid var(--line);
      border-radius: 4px;
      padding: 0 6px;
      font: inherit;
    }
    .btn {
      height: var(--ctrl-h);
      border: 1px solid var(--line);
      border-radius: 5px;
      background: var(--panel);
      color: var(--text);
      padding: 0 10px;
      cursor: pointer;
      font-size: var(--font-sm);
      line-height: 1;
    }
    .btn:hover { border-color: var(--accent); color: var(--accent); }
    .btn.primary {
      background: var(--accent);
      border-color: var(--accent);
      color: #ffffff;
    }
    .btn.danger:hover { border-color: var(--danger); color: var(--danger); }
    .btn.copied {
      background: #e4f5ec;
      border-color: var(--ok);
      color: var(--ok);
    }
    main {
      flex: 1 1 auto;
      min-height: 0;
      display: flex;
      align-items: flex-start;
      gap: 14px;
      padding: 14px 16px;
      overflow-x: auto;
    }
    .column {
      flex: 0 0 var(--card-w);
      max-height: 100%;
      display: flex;
      flex-direction: column;
      background: var(--panel);
      border: 1px solid var(--line);
      border-radius: 8px;
      overflow: hidden;
    }
    .column-header {
      flex: 0 0 auto;
      display: flex;
      align-items: center;
      gap: 6px;
      padding: 8px 10px;
      border-bottom: 1px solid var(--line);
    }
    .column-header .dot {
      flex: 0 0 8px;
      height: 8px;
      border-radius: 50%;
      background: var(--accent);
    }
    .column-header input {
      flex: 1 1 auto;
      min-width: 0;
      border: none;
      outline: none;
      font: inherit;
      font-weight: 600;
    }
    .paste-pane {
      flex: 0 0 auto;
      position: relative;
      padding: 8px 10px;
      border-bottom: 1px solid var(--line);
    }
    .paste-pane textarea {
      width: 100%;
      height: 110px;
      border: 1px solid var(--line);
      border-radius: 6px;
      padding: 6px 8px;
      font-family: ui-monospace, monospace;
      font-size: 11px;
      resize: none;
      outline: none;
    }
    .paste-pane textarea:focus { border-color: var(--accent); }
    .url-count {
      position: absolute;
      right: 16px;
      bottom: 16px;
      background: var(--accent);
      color: #ffffff;
      border-radius: 3px;
      padding: 1px 6px;
      font-size: 10px;
    }
    .cards {
      flex: 1 1 auto;
      min-height: 0;
      overflow-y: auto;
      padding: 8px 10px;
      display: flex;
      flex-direction: column;
      gap: 8px;
    }
    .card {
      border: 1px solid var(--line);
      border-radius: 6px;
      padding: 8px;
    }
    .card-toolbar {
      display: flex;
      align-items: center;
      justify-content: space-between;
      gap: 4px;
      margin-bottom: 6px;
    }
    .card-toolbar .index {
      font-size: 10px;
      color: var(--muted);
    }
    .card-toolbar .card-actions {
      display: flex;
      gap: 4px;
      flex-wrap: wrap;
    }
    .card-toolbar .btn { height: 22px; padding: 0 6px; font-size: 10px; }
    .card input.url {
      width: 100%;
      border: 1px solid var(--line);
      border-radius: 4px;
      padding: 4px 6px;
      font-family: ui-monospace, monospace;
      font-size: 11px;
      outline: none;
    }
    .card input.url:focus { border-color: var(--accent); }
    .thumb {
      margin-top: 6px;
      display: flex;
      justify-content: center;
    }
    .thumb img {
      max-width: 84px;
      max-height: 84px;
      object-fit: contain;
      border: 1px solid var(--line);
      border-radius: 4px;
      background: var(--bg);
      cursor: zoom-in;
    }
    .empty-hint {
      padding: 40px 0;
      text-align: center;
      color: var(--muted);
      font-size: var(--font-sm);
    }
    .add-column {
      flex: 0 0 var(--card-w);
      height: 120px;
      border: 2px dashed var(--line);
      border-radius: 8px;
      background: transparent;
      color: var(--muted);
      font-size: 13px;
      cursor: pointer;
    }
    .add-column:hover { border-color: var(--accent); color: var(--accent); }
    footer {
      flex: 0 0 auto;
      display: flex;
      align-items: center;
      justify-content: space-between;
      padding: 5px 16px;
      background: var(--panel);
      border-top: 1px solid var(--line);
      font-size: 10px;
      color: var(--muted);
      letter-spacing: 0.15em;
    }
    .status { color: var(--danger); letter-spacing: normal; }
    #overlay {
      position: fixed;
      inset: 0;
      display: none;
      align-items: center;
      justify-content: center;
      background: rgba(0, 0, 0, 0.8);
      z-index: 100;
      cursor: zoom-out;
    }
    #overlay.show { display: flex; }
    #overlay img {
      max-width: 90vw;
      max-height: 90vh;
      object-fit: contain;
      border-radius: 6px;
    }
  </style>
</head>
<body>
  <header>
    <div class="brand">
      <h1>图片管理工具</h1>
      <p>图片对比与管理面板</p>
    </div>
    <div class="toolbar">
      <div class="settings">
        <label>预览尺寸 <input id="previewSize" type="number" min="1" step="1" /></label>
        <label><input id="tableWrapper" type="checkbox" /> 表格包裹</label>
      </div>
      <button id="addGroup" class="btn primary">＋ 添加分组</button>
    </div>
  </header>

  <main id="board"></main>

  <footer>
    <div>
      <span id="groupCount">分组数: 0</span>
      <span id="urlCount" style="margin-left: 14px;">图片总数: 0</span>
    </div>
    <span id="status" class="status"></span>
  </footer>

  <div id="overlay"><img id="overlayImage" alt="预览" /></div>

  <script>
    const PLACEHOLDER_IMAGE = "__PLACEHOLDER_IMAGE__";
    const COPY_FEEDBACK_MS = 2000;
    const state = {
      groups: [],
      preview_size: 100,
      use_table_wrapper: true,
      confirm_delete: true,
    };
    const collapsed = {};

    function setStatus(message) {
      const status = document.getElementById("status");
      status.textContent = message || "";
    }

    async function apiGet(path) {
      const res = await fetch(path, { method: "GET" });
      const data = await res.json();
      if (!res.ok || !data.ok) {
        throw new Error(data.error || "request failed");
      }
      return data;
    }

    async function apiPost(path, body) {
      const res = await fetch(path, {
        method: "POST",
        headers: { "Content-Type": "application/json" },
        body: JSON.stringify(body || {}),
      });
      const data = await res.json();
      if (!res.ok || !data.ok) {
        throw new Error(data.error || "request failed");
      }
      return data;
    }

    async function mutate(path, body) {
      try {
        applySnapshot(await apiPost(path, body));
        setStatus("");
      } catch (err) {
        setStatus(`保存错误: ${err.message}`);
      }
    }

    function applySnapshot(payload) {
      state.groups = payload.groups || [];
      if (Number.isFinite(payload.preview_size)) {
        state.preview_size = payload.preview_size;
      }
      if (typeof payload.use_table_wrapper === "boolean") {
        state.use_table_wrapper = payload.use_table_wrapper;
      }
      if (typeof payload.confirm_delete === "boolean") {
        state.confirm_delete = payload.confirm_delete;
      }
      render();
    }

    function showCopied(button) {
      if (!button.dataset.label) {
        button.dataset.label = button.textContent;
      }
      button.textContent = "已复制";
      button.classList.add("copied");
      if (button._copiedTimer) {
        clearTimeout(button._copiedTimer);
      }
      button._copiedTimer = setTimeout(() => {
        button.textContent = button.dataset.label;
        button.classList.remove("copied");
        button._copiedTimer = null;
      }, COPY_FEEDBACK_MS);
    }

    function fallbackCopy(text, button) {
      const textarea = document.createElement("textarea");
      textarea.value = text;
      textarea.style.position = "fixed";
      textarea.style.top = "0";
      textarea.style.left = "0";
      textarea.style.opacity = "0";
      document.body.appendChild(textarea);
      textarea.focus();
      textarea.select();
      try {
        if (document.execCommand("copy")) {
          showCopied(button);
        }
      } catch (_) {
        // Clipboard unavailable: the button simply never confirms.
      }
      document.body.removeChild(textarea);
    }

    function copyToClipboard(text, button) {
      if (navigator.clipboard && navigator.clipboard.writeText) {
        navigator.clipboard
          .writeText(text)
          .then(() => showCopied(button))
          .catch(() => fallbackCopy(text, button));
      } else {
        fallbackCopy(text, button);
      }
    }

    function openOverlay(url) {
      document.getElementById("overlayImage").src = url;
      document.getElementById("overlay").classList.add("show");
    }

    function smallButton(label, extraClass) {
      const button = document.createElement("button");
      button.className = extraClass ? `btn ${extraClass}` : "btn";
      button.textContent = label;
      return button;
    }

    function buildUrlCard(group, index) {
      const card = document.createElement("div");
      card.className = "card";

      const toolbar = document.createElement("div");
      toolbar.className = "card-toolbar";

      const indexLabel = document.createElement("span");
      indexLabel.className = "index";
      indexLabel.textContent = `#${index + 1} 图片地址`;

      const actions = document.createElement("div");
      actions.className = "card-actions";

      const copyUrlBtn = smallButton("复制地址");
      copyUrlBtn.addEventListener("click", () => {
        copyToClipboard(group.urls[index], copyUrlBtn);
      });

      const copyHtmlBtn = smallButton("复制HTML");
      const snippet = group.snippets[index] || "";
      copyHtmlBtn.disabled = snippet === "";
      copyHtmlBtn.addEventListener("click", () => {
        copyToClipboard(snippet, copyHtmlBtn);
      });

      const insertAboveBtn = smallButton("上方插入");
      insertAboveBtn.addEventListener("click", async () => {
        await mutate("/app/url-insert", {
          group_id: group.id,
          index,
          position: "above",
        });
      });

      const insertBelowBtn = smallButton("下方插入");
      insertBelowBtn.addEventListener("click", async () => {
        await mutate("/app/url-insert", {
          group_id: group.id,
          index,
          position: "below",
        });
      });

      const deleteBtn = smallButton("删除", "danger");
      deleteBtn.addEventListener("click", async () => {
        await mutate("/app/url-remove", { group_id: group.id, index });
      });

      actions.appendChild(copyUrlBtn);
      actions.appendChild(copyHtmlBtn);
      actions.appendChild(insertAboveBtn);
      actions.appendChild(insertBelowBtn);
      actions.appendChild(deleteBtn);
      toolbar.appendChild(indexLabel);
      toolbar.appendChild(actions);

      const urlInput = document.createElement("input");
      urlInput.className = "url";
      urlInput.type = "text";
      urlInput.placeholder = "输入图片URL...";
      urlInput.value = group.urls[index];
      urlInput.addEventListener("change", async () => {
        await mutate("/app/url-update", {
          group_id: group.id,
          index,
          value: urlInput.value,
        });
      });

      card.appendChild(toolbar);
      card.appendChild(urlInput);

      if (group.urls[index]) {
        const thumb = document.createElement("div");
        thumb.className = "thumb";
        const img = document.createElement("img");
        img.src = group.urls[index];
        img.alt = `图片 ${index + 1}`;
        img.loading = "lazy";
        img.addEventListener("error", () => {
          img.src = PLACEHOLDER_IMAGE;
        });
        img.addEventListener("click", () => openOverlay(group.urls[index]));
        thumb.appendChild(img);
        card.appendChild(thumb);
      }

      return card;
    }

    function buildColumn(group) {
      const column = document.createElement("div");
      column.className = "column";

      const header = document.createElement("div");
      header.className = "column-header";

      const dot = document.createElement("span");
      dot.className = "dot";

      const titleInput = document.createElement("input");
      titleInput.type = "text";
      titleInput.placeholder = "分组标题...";
      titleInput.value = group.title;
      titleInput.addEventListener("change", async () => {
        await mutate("/app/group-rename", {
          group_id: group.id,
          title: titleInput.value,
        });
      });

      const toggleBtn = smallButton(collapsed[group.id] ? "展开" : "收起");
      toggleBtn.title = collapsed[group.id] ? "展开输入框" : "收起输入框";
      toggleBtn.addEventListener("click", () => {
        collapsed[group.id] = !collapsed[group.id];
        render();
      });

      const deleteBtn = smallButton("删除", "danger");
      deleteBtn.addEventListener("click", async () => {
        if (state.confirm_delete && !confirm("确定要删除整个分组吗？")) {
          return;
        }
        await mutate("/app/group-remove", { group_id: group.id });
      });

      header.appendChild(dot);
      header.appendChild(titleInput);
      header.appendChild(toggleBtn);
      header.appendChild(deleteBtn);
      column.appendChild(header);

      if (!collapsed[group.id]) {
        const pastePane = document.createElement("div");
        pastePane.className = "paste-pane";

        const textarea = document.createElement("textarea");
        textarea.placeholder = "在此粘贴图片URL\n每行一个URL...";
        textarea.value = group.urls.join("\n");
        textarea.addEventListener("change", async () => {
          await mutate("/app/group-urls", {
            group_id: group.id,
            text: textarea.value,
          });
        });

        const badge = document.createElement("span");
        badge.className = "url-count";
        badge.textContent = `已检测到 ${group.urls.length} 个URL`;

        pastePane.appendChild(textarea);
        pastePane.appendChild(badge);
        column.appendChild(pastePane);
      }

      const cards = document.createElement("div");
      cards.className = "cards";
      if (group.urls.length === 0) {
        const hint = document.createElement("div");
        hint.className = "empty-hint";
        hint.textContent = "等待添加URL";
        cards.appendChild(hint);
      } else {
        group.urls.forEach((_, index) => {
          cards.appendChild(buildUrlCard(group, index));
        });
      }
      column.appendChild(cards);

      return column;
    }

    function render() {
      const board = document.getElementById("board");
      board.innerHTML = "";
      for (const group of state.groups) {
        board.appendChild(buildColumn(group));
      }

      const addColumn = document.createElement("button");
      addColumn.className = "add-column";
      addColumn.textContent = "＋ 新建对比分组";
      addColumn.addEventListener("click", async () => {
        await mutate("/app/group-add", {});
      });
      board.appendChild(addColumn);

      const urlTotal = state.groups.reduce((acc, g) => acc + g.urls.length, 0);
      document.getElementById("groupCount").textContent = `分组数: ${state.groups.length}`;
      document.getElementById("urlCount").textContent = `图片总数: ${urlTotal}`;

      const sizeInput = document.getElementById("previewSize");
      if (document.activeElement !== sizeInput) {
        sizeInput.value = state.preview_size;
      }
      document.getElementById("tableWrapper").checked = state.use_table_wrapper;
    }

    async function pushRenderConfig() {
      const sizeInput = document.getElementById("previewSize");
      const size = parseInt(sizeInput.value, 10);
      await mutate("/app/config", {
        preview_size: Number.isFinite(size) && size > 0 ? size : state.preview_size,
        use_table_wrapper: document.getElementById("tableWrapper").checked,
      });
    }

    async function init() {
      try {
        applySnapshot(await apiGet("/app/init"));
      } catch (err) {
        setStatus(`启动错误: ${err.message}`);
      }
    }

    document.getElementById("addGroup").addEventListener("click", async () => {
      await mutate("/app/group-add", {});
    });
    document.getElementById("previewSize").addEventListener("change", pushRenderConfig);
    document.getElementById("tableWrapper").addEventListener("change", pushRenderConfig);
    document.getElementById("overlay").addEventListener("click", () => {
      document.getElementById("overlay").classList.remove("show");
    });

    init();
  </script>
</body>
</html>
"#;
